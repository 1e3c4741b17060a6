//! Per-file analysis pipeline.
//!
//! parse → imports and local aliases → class hierarchy and custom-element
//! identity → members and attributes → JSDoc surface → embedded-template
//! index and css contributions → exports. Malformed source never panics;
//! every stage degrades to the empty contribution for the entity it could
//! not read.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use cem_core::{CemError, Declaration, ErrorSink, Module, Result};
use cem_resolver::{extract_aliases, AliasMap, TypeResolver};
use cem_syntax::{Grammar, ParserPool, QueryManager};

use crate::classes::{class_spans, extract_classes, extract_defines};
use crate::css::extract_css_properties;
use crate::exports::extract_exports;
use crate::functions::extract_functions;
use crate::imports::{extract_imports, ImportMap};
use crate::jsdoc::parse_block;
use crate::templates::{extract_templates, TemplateKind, TemplateRange};

/// Everything the per-file extractors need, borrowed for one file.
pub struct FileContext<'a> {
    pub grammar: Grammar,
    pub path: &'a str,
    pub source: &'a [u8],
    pub pool: &'a ParserPool,
    pub queries: &'a QueryManager,
    pub imports: &'a ImportMap,
    pub aliases: &'a AliasMap,
    pub resolver: Option<&'a TypeResolver>,
    pub source_root_url: Option<&'a str>,
    pub cancel: &'a CancellationToken,
}

/// The partial manifest module produced from one source file, plus the
/// secondary template index consumed by the language server.
#[derive(Debug)]
pub struct ModuleAnalysis {
    pub module: Module,
    pub templates: Vec<TemplateRange>,
}

/// Reusable per-file analyzer. Cheap to clone; parsers and compiled
/// queries are shared.
#[derive(Clone)]
pub struct Analyzer {
    pool: ParserPool,
    queries: Arc<QueryManager>,
    resolver: Option<Arc<TypeResolver>>,
    source_root_url: Option<String>,
}

impl Analyzer {
    pub fn new(
        pool: ParserPool,
        queries: Arc<QueryManager>,
        resolver: Option<Arc<TypeResolver>>,
        source_root_url: Option<String>,
    ) -> Self {
        Self {
            pool,
            queries,
            resolver,
            source_root_url,
        }
    }

    pub fn pool(&self) -> &ParserPool {
        &self.pool
    }

    pub fn queries(&self) -> &Arc<QueryManager> {
        &self.queries
    }

    /// Analyzes one source file into a partial module.
    ///
    /// Non-fatal problems (unresolvable imported types) land in `sink`;
    /// the returned error is reserved for files that cannot be analyzed at
    /// all (unsupported grammar, parser failure, cancellation).
    pub fn analyze_module(
        &self,
        path: &str,
        source: &[u8],
        cancel: &CancellationToken,
        sink: &mut ErrorSink,
    ) -> Result<ModuleAnalysis> {
        if cancel.is_cancelled() {
            return Err(CemError::Cancelled);
        }

        let grammar = Grammar::for_path(std::path::Path::new(path))
            .filter(|g| g.is_script())
            .ok_or_else(|| CemError::Parse {
                path: path.to_string(),
                message: "not a script module".into(),
            })?;

        let tree = self
            .pool
            .parse(grammar, source)
            .ok_or_else(|| CemError::Parse {
                path: path.to_string(),
                message: "tree-sitter produced no tree".into(),
            })?;
        if tree.root_node().has_error() {
            tracing::debug!(path, "syntax errors present, analyzing best-effort");
        }

        let imports = extract_imports(&self.queries, grammar, &tree, source);
        let aliases = extract_aliases(&self.pool, &self.queries, grammar, source);

        let file = FileContext {
            grammar,
            path,
            source,
            pool: &self.pool,
            queries: &self.queries,
            imports: &imports,
            aliases: &aliases,
            resolver: self.resolver.as_deref(),
            source_root_url: self.source_root_url.as_deref(),
            cancel,
        };

        if cancel.is_cancelled() {
            return Err(CemError::Cancelled);
        }

        let defines = extract_defines(&file, &tree);
        let mut classes = extract_classes(&file, &tree, &defines, sink);
        let functions = extract_functions(&file, &tree, sink);
        let templates = extract_templates(&self.queries, grammar, &tree, source, &imports);

        if cancel.is_cancelled() {
            return Err(CemError::Cancelled);
        }

        // Styles declared inside the class contribute css custom
        // properties to that class; JSDoc-declared entries win on name
        // collisions.
        let spans = class_spans(&file, &tree);
        for template in templates.iter().filter(|t| t.kind == TemplateKind::Css) {
            let Some((owner, _)) = spans
                .iter()
                .find(|(_, span)| span.contains(&template.start))
            else {
                continue;
            };
            let css_text = String::from_utf8_lossy(&source[template.start..template.end]);
            let contributed = extract_css_properties(&self.pool, &self.queries, &css_text);
            if let Some((_, class)) = classes.iter_mut().find(|(_, c)| &c.name == owner) {
                for prop in contributed {
                    if !class.css_properties.iter().any(|p| p.name == prop.name) {
                        class.css_properties.push(prop);
                    }
                }
            }
        }

        let mut module = Module::new(path);
        module.summary = module_summary(&tree, source);
        module.exports = extract_exports(&file, &tree, &defines);

        let mut declarations: Vec<(usize, Declaration)> = classes
            .into_iter()
            .map(|(offset, class)| (offset, Declaration::Class(class)))
            .chain(functions)
            .collect();
        declarations.sort_by_key(|(offset, _)| *offset);
        module.declarations = declarations.into_iter().map(|(_, decl)| decl).collect();

        Ok(ModuleAnalysis { module, templates })
    }
}

/// A file-leading `/** @module ... */` block provides the module summary.
fn module_summary(tree: &tree_sitter::Tree, source: &[u8]) -> Option<String> {
    let first = tree.root_node().named_child(0)?;
    if first.kind() != "comment" {
        return None;
    }
    let comment = first.utf8_text(source).ok()?;
    if !comment.starts_with("/**") || !comment.contains("@module") {
        return None;
    }
    let info = parse_block(comment);
    info.summary.or(info.description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::{Export, Member, Privacy};
    use pretty_assertions::assert_eq;

    fn analyzer() -> Analyzer {
        Analyzer::new(
            ParserPool::new(),
            Arc::new(QueryManager::new()),
            None,
            Some("https://github.com/acme/elements/tree/main".into()),
        )
    }

    fn analyze(path: &str, source: &str) -> (ModuleAnalysis, ErrorSink) {
        let mut sink = ErrorSink::new();
        let analysis = analyzer()
            .analyze_module(path, source.as_bytes(), &CancellationToken::new(), &mut sink)
            .unwrap();
        (analysis, sink)
    }

    const BUTTON: &str = r#"import { LitElement, html, css } from 'lit';
import { customElement, property } from 'lit/decorators.js';

type Variant = 'primary' | 'secondary' | 'danger';

/**
 * A clickable button.
 *
 * @summary Fancy button
 * @slot - Button label
 * @slot icon - Icon before the label
 * @csspart button - The native button
 * @cssprop [--my-button-radius=4px] - Corner radius
 * @fires click-count - Fired on every click
 */
@customElement('my-button')
export class MyButton extends LitElement {
  static styles = css`
    :host {
      color: var(--my-button-color, rebeccapurple);
    }
  `;

  /** Visual variant of the button. */
  @property({ reflect: true })
  variant: Variant = 'primary';

  @property({ type: Boolean, attribute: 'is-disabled' })
  disabled = false;

  @property({ attribute: false })
  internalState = 0;

  #clicks = 0;

  private render() {
    return html`<button part="button"><slot></slot></button>`;
  }

  /** Programmatic click. */
  click(): void {}
}
"#;

    #[test]
    fn full_element_analysis() {
        let (analysis, sink) = analyze("src/my-button.ts", BUTTON);
        assert!(sink.is_empty(), "{:?}", sink.errors());

        let module = &analysis.module;
        assert_eq!(module.path, "src/my-button.ts");
        assert_eq!(module.declarations.len(), 1);

        let Declaration::Class(class) = &module.declarations[0] else {
            panic!("expected class");
        };
        assert_eq!(class.name, "MyButton");
        assert!(class.custom_element);
        assert_eq!(class.tag_name.as_deref(), Some("my-button"));
        assert_eq!(class.summary.as_deref(), Some("Fancy button"));
        assert_eq!(class.description.as_deref(), Some("A clickable button."));
        assert_eq!(class.superclass.as_ref().unwrap().name, "LitElement");
        assert_eq!(class.superclass.as_ref().unwrap().package.as_deref(), Some("lit"));
        assert!(class
            .source
            .as_ref()
            .unwrap()
            .href
            .contains("src/my-button.ts#L"));
    }

    #[test]
    fn attribute_inference() {
        let (analysis, _) = analyze("src/my-button.ts", BUTTON);
        let Declaration::Class(class) = &analysis.module.declarations[0] else {
            panic!()
        };

        // `internalState` is suppressed; two attributes remain.
        assert_eq!(class.attributes.len(), 2);

        let variant = class.attribute("variant").unwrap();
        assert_eq!(variant.field_name.as_deref(), Some("variant"));
        assert!(variant.reflects);
        assert_eq!(
            variant.type_text.as_deref(),
            Some("'primary' | 'secondary' | 'danger'")
        );
        assert_eq!(
            variant.values,
            vec!["primary".to_string(), "secondary".into(), "danger".into()]
        );
        assert_eq!(variant.default.as_deref(), Some("'primary'"));
        assert_eq!(
            variant.description.as_deref(),
            Some("Visual variant of the button.")
        );

        let disabled = class.attribute("is-disabled").unwrap();
        assert_eq!(disabled.field_name.as_deref(), Some("disabled"));
        assert!(!disabled.reflects);
        assert_eq!(disabled.type_text.as_deref(), Some("boolean"));
    }

    #[test]
    fn jsdoc_surface() {
        let (analysis, _) = analyze("src/my-button.ts", BUTTON);
        let Declaration::Class(class) = &analysis.module.declarations[0] else {
            panic!()
        };

        assert_eq!(class.slots.len(), 2);
        assert_eq!(class.slots[0].name, "");
        assert_eq!(class.slots[1].name, "icon");
        assert_eq!(class.css_parts[0].name, "button");
        assert_eq!(class.events[0].name, "click-count");

        // JSDoc property plus the var() consumption from static styles.
        let names: Vec<_> = class.css_properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["--my-button-radius", "--my-button-color"]);
        assert_eq!(
            class.css_properties[1].default.as_deref(),
            Some("rebeccapurple")
        );
    }

    #[test]
    fn member_privacy_and_statics() {
        let (analysis, _) = analyze("src/my-button.ts", BUTTON);
        let Declaration::Class(class) = &analysis.module.declarations[0] else {
            panic!()
        };

        let styles = class
            .members
            .iter()
            .find(|m| m.name() == "styles")
            .unwrap();
        let Member::Field(styles) = styles else { panic!() };
        assert!(styles.is_static);

        let clicks = class.members.iter().find(|m| m.name() == "#clicks").unwrap();
        assert_eq!(clicks.privacy(), Privacy::Private);

        let render = class.members.iter().find(|m| m.name() == "render").unwrap();
        assert_eq!(render.privacy(), Privacy::Private);

        let click = class.members.iter().find(|m| m.name() == "click").unwrap();
        let Member::Method(click) = click else { panic!() };
        assert_eq!(click.return_type.as_ref().unwrap().text, "void");
        assert_eq!(click.description.as_deref(), Some("Programmatic click."));

        assert!(!class.members.iter().any(|m| m.name() == "constructor"));
    }

    #[test]
    fn exports_and_template_index() {
        let (analysis, _) = analyze("src/my-button.ts", BUTTON);
        assert!(analysis
            .module
            .exports
            .iter()
            .any(|e| matches!(e, Export::Js { name, .. } if name == "MyButton")));

        // One css template (static styles) and one html template (render).
        assert_eq!(analysis.templates.len(), 2);
        assert!(analysis.templates.iter().any(|t| t.kind == TemplateKind::Css));
        assert!(analysis.templates.iter().any(|t| t.kind == TemplateKind::Html));
    }

    #[test]
    fn define_call_detection() {
        let source = r"
            class FancyCard extends HTMLElement {}
            customElements.define('fancy-card', FancyCard);
        ";
        let (analysis, _) = analyze("src/fancy-card.ts", source);
        let Declaration::Class(class) = &analysis.module.declarations[0] else {
            panic!()
        };
        assert!(class.custom_element);
        assert_eq!(class.tag_name.as_deref(), Some("fancy-card"));
        assert!(analysis.module.exports.iter().any(|e| matches!(
            e,
            Export::CustomElementDefinition { name, .. } if name == "fancy-card"
        )));
    }

    #[test]
    fn jsdoc_linked_custom_element() {
        let source = r"
            /** @customElement linked-el */
            export class LinkedEl extends HTMLElement {}
        ";
        let (analysis, _) = analyze("src/linked.ts", source);
        let Declaration::Class(class) = &analysis.module.declarations[0] else {
            panic!()
        };
        assert_eq!(class.tag_name.as_deref(), Some("linked-el"));
    }

    #[test]
    fn plain_class_is_not_a_custom_element() {
        let (analysis, _) = analyze("src/util.ts", "export class Helper {}");
        let Declaration::Class(class) = &analysis.module.declarations[0] else {
            panic!()
        };
        assert!(!class.custom_element);
        assert!(class.tag_name.is_none());
    }

    #[test]
    fn exported_function_and_variable_declarations() {
        let source = r"
            /** @summary Formats a label */
            export function formatLabel(value: string): string { return value; }
            export const VERSION: string = '1.2.3';
        ";
        let (analysis, _) = analyze("src/util.ts", source);
        assert_eq!(analysis.module.declarations.len(), 2);
        let Declaration::Function(f) = &analysis.module.declarations[0] else {
            panic!()
        };
        assert_eq!(f.name, "formatLabel");
        assert_eq!(f.summary.as_deref(), Some("Formats a label"));
        assert_eq!(f.parameters[0].name, "value");
        let Declaration::Variable(v) = &analysis.module.declarations[1] else {
            panic!()
        };
        assert_eq!(v.name, "VERSION");
        assert_eq!(v.default.as_deref(), Some("'1.2.3'"));
    }

    #[test]
    fn mixin_detection() {
        let source = r"
            export const Toggleable = (base) => class extends base {
                toggled = false;
                toggle() {}
            };
        ";
        let (analysis, _) = analyze("src/toggleable.js", source);
        let Declaration::Mixin(mixin) = &analysis.module.declarations[0] else {
            panic!("expected mixin, got {:?}", analysis.module.declarations[0]);
        };
        assert_eq!(mixin.name, "Toggleable");
        assert_eq!(mixin.parameters[0].name, "base");
        assert!(mixin.members.iter().any(|m| m.name() == "toggle"));
    }

    #[test]
    fn malformed_source_degrades_without_panic() {
        let source = "export class Broken extends { @@@ nonsense";
        let mut sink = ErrorSink::new();
        let result = analyzer().analyze_module(
            "src/broken.ts",
            source.as_bytes(),
            &CancellationToken::new(),
            &mut sink,
        );
        // Either a best-effort module or a parse error; never a panic.
        match result {
            Ok(analysis) => assert_eq!(analysis.module.path, "src/broken.ts"),
            Err(CemError::Parse { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unsupported_grammar_is_a_parse_error() {
        let mut sink = ErrorSink::new();
        let err = analyzer()
            .analyze_module("styles.css", b"a{}", &CancellationToken::new(), &mut sink)
            .unwrap_err();
        assert!(matches!(err, CemError::Parse { .. }));
    }

    #[test]
    fn cancellation_observed() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut sink = ErrorSink::new();
        let err = analyzer()
            .analyze_module("src/a.ts", b"export {}", &cancel, &mut sink)
            .unwrap_err();
        assert!(matches!(err, CemError::Cancelled));
    }

    #[test]
    fn module_summary_from_module_block() {
        let source = "/**\n * Shared helpers.\n * @module\n */\nexport const x = 1;";
        let (analysis, _) = analyze("src/helpers.ts", source);
        assert_eq!(analysis.module.summary.as_deref(), Some("Shared helpers."));
    }
}
