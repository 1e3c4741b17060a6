//! Demo discovery: matching demo HTML files to elements and generating
//! canonical URLs.
//!
//! Association priority, first match wins:
//! 1. `demo-for` microdata
//! 2. URL-pattern parameters whose values are well-formed tag names
//! 3. custom-element tags appearing in the demo content
//!
//! URL priority: `demo-url` microdata, then URL-template interpolation,
//! otherwise the demo is skipped.

use std::collections::HashMap;

use globset::GlobBuilder;
use walkdir::WalkDir;

use cem_core::{CemError, Config, Demo, Package, Result, SourceReference};
use cem_syntax::{ParserPool, QueryManager};
use cem_workspace::WorkspaceContext;

use crate::microdata::{is_custom_element_tag, DemoDoc};
use crate::url_pattern::UrlPattern;
use crate::url_template::UrlTemplate;

/// Tag name to the demos attached to it, in discovery order.
pub type DemoMap = HashMap<String, Vec<Demo>>;

/// Discovers demos for the configured demo glob.
pub fn discover(
    ctx: &WorkspaceContext,
    config: &Config,
    pool: &ParserPool,
    queries: &QueryManager,
) -> Result<DemoMap> {
    let discovery = &config.generate.demo_discovery;
    let Some(file_glob) = discovery.file_glob.as_deref() else {
        return Ok(DemoMap::new());
    };

    let matcher = GlobBuilder::new(file_glob)
        .literal_separator(false)
        .build()
        .map_err(|e| CemError::config(format!("invalid demo glob '{file_glob}': {e}")))?
        .compile_matcher();

    let pattern = discovery
        .url_pattern
        .as_deref()
        .map(UrlPattern::compile)
        .transpose()?;
    let template = discovery
        .url_template
        .as_deref()
        .map(UrlTemplate::compile)
        .transpose()?;

    let mut demo_files: Vec<String> = WalkDir::new(ctx.root())
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| ctx.relative(e.path()))
        .filter(|rel| matcher.is_match(rel))
        .collect();
    demo_files.sort();

    let mut map = DemoMap::new();
    for path in demo_files {
        let html = match ctx.read_to_string(std::path::Path::new(&path)) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("skipping unreadable demo {path}: {e}");
                continue;
            }
        };
        let doc = DemoDoc::parse(pool, queries, &html);
        let params = pattern.as_ref().and_then(|p| p.execute(&path));

        let tags = associate(&doc, params.as_ref());
        if tags.is_empty() {
            tracing::debug!("demo {path} associates with no element");
            continue;
        }

        let Some(url) = canonical_url(&doc, template.as_ref(), params.as_ref(), config) else {
            tracing::debug!("demo {path} has no canonical url, skipped");
            continue;
        };

        let demo = Demo {
            url,
            description: doc.description.clone(),
            source: config.source_control_root_url.as_deref().map(|root| {
                SourceReference {
                    href: format!("{}/{path}", root.trim_end_matches('/')),
                }
            }),
        };
        for tag in tags {
            map.entry(tag).or_default().push(demo.clone());
        }
    }

    Ok(map)
}

/// Applies the association priority for one demo document.
fn associate(doc: &DemoDoc, params: Option<&HashMap<String, String>>) -> Vec<String> {
    if !doc.demo_for.is_empty() {
        return doc.demo_for.clone();
    }
    if let Some(params) = params {
        let mut tags: Vec<String> = params
            .values()
            .filter(|v| is_custom_element_tag(v))
            .cloned()
            .collect();
        tags.sort();
        if !tags.is_empty() {
            return tags;
        }
    }
    doc.content_tags.clone()
}

fn canonical_url(
    doc: &DemoDoc,
    template: Option<&UrlTemplate>,
    params: Option<&HashMap<String, String>>,
    config: &Config,
) -> Option<String> {
    if let Some(explicit) = &doc.demo_url {
        return Some(explicit.clone());
    }
    let (template, params) = (template?, params?);
    Some(template.render(params, &config.generate.demo_discovery.alias))
}

/// Attaches discovered demos to the matching custom elements of a package,
/// preserving discovery order.
pub fn attach_demos(package: &mut Package, map: &DemoMap) {
    for module in &mut package.modules {
        for declaration in &mut module.declarations {
            let cem_core::Declaration::Class(class) = declaration else {
                continue;
            };
            let Some(tag) = class.tag_name.as_deref() else {
                continue;
            };
            if let Some(demos) = map.get(tag) {
                class.demos = demos.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::{DemoDiscoveryConfig, GenerateConfig};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn config(
        file_glob: &str,
        url_pattern: Option<&str>,
        url_template: Option<&str>,
        alias: &[(&str, &str)],
    ) -> Config {
        Config {
            source_control_root_url: None,
            generate: GenerateConfig {
                demo_discovery: DemoDiscoveryConfig {
                    file_glob: Some(file_glob.into()),
                    url_pattern: url_pattern.map(Into::into),
                    url_template: url_template.map(Into::into),
                    alias: alias
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                },
                ..GenerateConfig::default()
            },
            ..Config::default()
        }
    }

    fn run(root: &Path, config: &Config) -> DemoMap {
        discover(
            &WorkspaceContext::rooted(root),
            config,
            &ParserPool::new(),
            &QueryManager::new(),
        )
        .unwrap()
    }

    #[test]
    fn pattern_association_with_alias_template() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("components/my-button/demo/primary.html"),
            "<my-button></my-button>",
        );

        let config = config(
            "components/*/demo/*.html",
            Some("/components/:element/demo/:demo.html"),
            Some("https://site.com/components/{{.element | alias}}/demo/{{.demo}}/"),
            &[("my-button", "button-alias")],
        );
        let map = run(tmp.path(), &config);

        let demos = &map["my-button"];
        assert_eq!(demos.len(), 1);
        assert_eq!(
            demos[0].url,
            "https://site.com/components/button-alias/demo/primary/"
        );
    }

    #[test]
    fn ssg_index_collapse() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("elements/rh-accordion/demo/index.html"),
            "<rh-accordion></rh-accordion>",
        );

        let config = config(
            "elements/*/demo/*.html",
            Some("/elements/:element/demo/:demo.html"),
            Some("https://ux.redhat.com/elements/{{.element | alias | slug}}/demo/{{.demo}}/"),
            &[("rh-accordion", "rh-accordion")],
        );
        let map = run(tmp.path(), &config);
        assert_eq!(
            map["rh-accordion"][0].url,
            "https://ux.redhat.com/elements/rh-accordion/demo/"
        );
    }

    #[test]
    fn microdata_url_overrides_template() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("components/my-card/demo/basic.html"),
            r#"<meta itemprop="demo-url" content="/explicit/url/"><my-card></my-card>"#,
        );

        let config = config(
            "components/*/demo/*.html",
            Some("/components/:element/demo/:demo.html"),
            Some("https://site.com/{{.element}}/{{.demo}}/"),
            &[],
        );
        let map = run(tmp.path(), &config);
        assert_eq!(map["my-card"][0].url, "/explicit/url/");
    }

    #[test]
    fn demo_for_beats_content_scan() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("demos/buttons.html"),
            r#"<meta itemprop="demo-url" content="/buttons/">
               <meta itemprop="demo-for" content="rh-button pf-button">
               <rh-card></rh-card>"#,
        );

        let config = config("demos/*.html", None, None, &[]);
        let map = run(tmp.path(), &config);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("rh-button"));
        assert!(map.contains_key("pf-button"));
        assert!(!map.contains_key("rh-card"));
    }

    #[test]
    fn content_scan_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("demos/card.html"),
            r#"<meta itemprop="demo-url" content="/card/"><fancy-card></fancy-card>"#,
        );

        let config = config("demos/*.html", None, None, &[]);
        let map = run(tmp.path(), &config);
        assert!(map.contains_key("fancy-card"));
    }

    #[test]
    fn demo_without_url_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("demos/a.html"), "<my-el></my-el>");

        let config = config("demos/*.html", None, None, &[]);
        let map = run(tmp.path(), &config);
        assert!(map.is_empty());
    }

    #[test]
    fn description_flows_into_demo() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("demos/a.html"),
            r#"<meta itemprop="demo-url" content="/a/">
               <meta itemprop="description" content="Basic usage">
               <x-y></x-y>"#,
        );
        let config = config("demos/*.html", None, None, &[]);
        let map = run(tmp.path(), &config);
        assert_eq!(map["x-y"][0].description.as_deref(), Some("Basic usage"));
    }

    #[test]
    fn no_glob_means_no_demos() {
        let tmp = tempfile::tempdir().unwrap();
        let map = run(tmp.path(), &Config::default());
        assert!(map.is_empty());
    }

    #[test]
    fn attach_demos_to_package() {
        let mut package = Package::new();
        let mut class = cem_core::ClassDeclaration::new("XY");
        class.custom_element = true;
        class.tag_name = Some("x-y".into());
        let mut module = cem_core::Module::new("src/x-y.ts");
        module.declarations.push(cem_core::Declaration::Class(class));
        package.modules.push(module);

        let mut map = DemoMap::new();
        map.insert(
            "x-y".into(),
            vec![Demo {
                url: "https://site.com/x-y/demo/".into(),
                ..Demo::default()
            }],
        );

        attach_demos(&mut package, &map);
        let (_, class) = package.custom_elements().next().unwrap();
        assert_eq!(class.demos.len(), 1);
    }
}
