//! The compile driver: a pure fold over the element tree.
//!
//! Each element's resolution depends only on ancestor context and the
//! shared, read-only registries in the [`ProjectContext`]; no element
//! mutates shared or sibling state. Per-run state (memo cache,
//! diagnostics, provenance, token usage) is created per compile call and
//! dropped with it.

use attire_tokens::{resolve_value, TokenUsage, TokenWarning};
use serde_json::{Map, Value};
use tracing::{debug, debug_span};

use crate::context::{default_options, EffectiveOptions, ProjectContext};
use crate::css::{compute_style, DeclarationMap, DeclarationOrigin};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::element::{CompiledElement, Element, ElementPath};
use crate::error::CompileError;
use crate::hierarchy::{deep_merge, MergeCache};
use crate::precedence::PrecedenceContext;
use crate::provenance::{ProvSource, ProvenanceTracker, Stage};
use crate::styling::{compute_class, expand_stack, ClassSource, Overlap, StylingSystem};

/// The output of one compile call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    pub root: CompiledElement,
    /// The ordered diagnostic batch for the whole run.
    pub diagnostics: Vec<Diagnostic>,
    pub provenance: ProvenanceTracker,
    /// Whole-project token usage, consumed by the optimizer.
    pub usage: TokenUsage,
}

/// Per-run state, created per compile call and never shared across runs.
#[derive(Default)]
struct RunState {
    cache: MergeCache,
    diagnostics: Diagnostics,
    provenance: ProvenanceTracker,
    usage: TokenUsage,
}

/// Compiles element trees against a project context.
///
/// Construction validates the configuration eagerly — unknown styling
/// systems, unknown `extends` parents, and `extends` cycles are fatal
/// before any element is visited.
///
/// # Example
///
/// ```rust
/// use attire::{Compiler, Element, ElementKind, ProjectContext, StylingRegistry, StylingSystem};
/// use attire_tokens::TokenRegistry;
///
/// let context = ProjectContext::new()
///     .with_tokens(TokenRegistry::new().add("colors.primary", "#0af"))
///     .with_styling(StylingRegistry::new().add(StylingSystem::new("kit").base("button", "btn")))
///     .with_system("kit");
///
/// let compiler = Compiler::new(&context).unwrap();
/// let tree = Element::new(ElementKind::Button).prop("background", "$colors.primary");
/// let result = compiler.compile(&tree).unwrap();
/// assert_eq!(result.root.class.as_deref(), Some("btn"));
/// ```
#[derive(Debug)]
pub struct Compiler<'a> {
    context: &'a ProjectContext,
    /// The expanded styling stack in application order.
    systems: Vec<&'a StylingSystem>,
    overlaps: Vec<Overlap>,
    /// Options the project set away from the built-in defaults; the sparse
    /// project-config precedence source.
    project_options: Map<String, Value>,
    /// Merged system-global options, stack order, later wins.
    system_options: Map<String, Value>,
}

impl<'a> Compiler<'a> {
    /// Validates the context and prepares the styling stack.
    ///
    /// # Errors
    ///
    /// [`CompileError::Configuration`] for malformed hierarchy config or
    /// unknown system references; [`CompileError::StylingCycle`] for a
    /// cyclic `extends` chain, naming the full cycle.
    pub fn new(context: &'a ProjectContext) -> Result<Self, CompileError> {
        context.hierarchy.validate()?;
        let (systems, overlaps) = expand_stack(
            &context.styling,
            &context.stack,
            context.options.dedupe_extensions,
        )?;

        let mut system_options = Map::new();
        for system in &systems {
            deep_merge(&mut system_options, &system.options);
        }

        let defaults = default_options();
        let project_options: Map<String, Value> = context
            .options
            .as_map()
            .into_iter()
            .filter(|(key, value)| defaults.get(key) != Some(value))
            .collect();

        Ok(Self {
            context,
            systems,
            overlaps,
            project_options,
            system_options,
        })
    }

    /// Compiles one element tree.
    ///
    /// Recoverable conditions degrade to diagnostics, batched and returned
    /// with the result. Under `strict?`, the first element-scoped token
    /// failure aborts the whole compile instead.
    pub fn compile(&self, root: &Element) -> Result<CompileResult, CompileError> {
        let span = debug_span!("compile", systems = self.systems.len());
        let _enter = span.enter();

        let mut state = RunState::default();
        for overlap in &self.overlaps {
            state.diagnostics.warn(
                "extension-overlap",
                format!(
                    "styling system '{}' re-applies '{}' already present in the stack",
                    overlap.extending, overlap.ancestor
                ),
                None,
            );
        }

        let compiled = self.compile_element(root, ElementPath::root(&root.kind), &mut state)?;

        for conflict in state.provenance.conflicts() {
            state.diagnostics.warn(
                "value-conflict",
                format!(
                    "'{}' received {} competing values",
                    conflict.property,
                    conflict.values.len()
                ),
                Some(conflict.path.clone()),
            );
        }

        Ok(CompileResult {
            root: compiled,
            diagnostics: state.diagnostics.into_vec(),
            provenance: state.provenance,
            usage: state.usage,
        })
    }

    fn compile_element(
        &self,
        element: &Element,
        path: ElementPath,
        state: &mut RunState,
    ) -> Result<CompiledElement, CompileError> {
        let kind_key = element.kind.key().to_string();
        let path_str = path.to_string();
        debug!(path = %path_str, kind = %kind_key, "compiling element");

        let opts = self.effective_options(element, &kind_key, &path_str);

        // Styling system property contributions form the broadest layer,
        // under every hierarchy tier. Contributions are independent writes
        // from unordered sources; the conflict report surfaces disagreements.
        let mut base = Map::new();
        for system in &self.systems {
            for (_, props) in system.scoped_properties(&kind_key, &path_str) {
                deep_merge(&mut base, props);
                for (key, value) in props {
                    state.provenance.record_parallel(
                        &path_str,
                        key,
                        value.clone(),
                        ProvSource::system(&system.name),
                        Stage::Hierarchy,
                    );
                }
            }
        }

        let (merged, trace) = state.cache.resolve(
            &self.context.hierarchy,
            &path,
            &kind_key,
            &base,
            &element.props,
        );
        for step in trace {
            let source = if step.source == "explicit" {
                ProvSource::explicit()
            } else {
                ProvSource::tier(&step.source)
            };
            state
                .provenance
                .record(&path_str, &step.key, step.value, source, Stage::Hierarchy);
        }

        let resolution = match resolve_value(
            &Value::Object(merged),
            &self.context.tokens,
            opts.on_missing_token,
            &mut state.usage,
        ) {
            Ok(resolution) => resolution,
            Err(err) => {
                if self.context.options.strict {
                    return Err(CompileError::TokenResolution {
                        path: path_str,
                        source: err,
                    });
                }
                state
                    .diagnostics
                    .error("missing-token", err.to_string(), Some(path_str.clone()));
                // The element's own attribute computation is abandoned;
                // children and siblings still compile.
                let children = self.compile_children(element, &path, state)?;
                return Ok(CompiledElement {
                    kind: element.kind.clone(),
                    path,
                    resolved: element.props.clone(),
                    class: None,
                    style: None,
                    declarations: DeclarationMap::new(),
                    children,
                });
            }
        };

        for warning in &resolution.warnings {
            let message = match warning {
                TokenWarning::Removed { path: token } => {
                    format!("token '${}' missing; property removed", token)
                }
                TokenWarning::PassedThrough { path: token } => {
                    format!("token '${}' missing; literal kept", token)
                }
            };
            state
                .diagnostics
                .warn("missing-token", message, Some(path_str.clone()));
        }
        for substitution in &resolution.substitutions {
            state.provenance.record(
                &path_str,
                &substitution.location,
                substitution.value.clone(),
                ProvSource::token(&substitution.token),
                Stage::Tokens,
            );
        }

        let resolved = match resolution.value {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let class_outcome = compute_class(&resolved, &kind_key, &path_str, &self.systems, &opts);
        for contribution in &class_outcome.contributions {
            let source = match &contribution.source {
                ClassSource::System { name, rule } => {
                    ProvSource::system(&format!("{}:{}", name, rule))
                }
                ClassSource::Explicit => ProvSource::explicit(),
            };
            state.provenance.record(
                &path_str,
                "@class",
                Value::String(contribution.classes.join(" ")),
                source,
                Stage::Styling,
            );
        }

        let style_outcome = compute_style(
            &resolved,
            &element.props,
            &resolution.substitutions,
            &self.context.platform,
            &opts,
        );
        if style_outcome.recovered {
            state.diagnostics.warn(
                "style-parse",
                "explicit style string is malformed; kept as one opaque declaration",
                Some(path_str.clone()),
            );
        }
        for declaration in style_outcome.extracted.iter() {
            state.provenance.record(
                &path_str,
                &format!("@style:{}", declaration.property),
                Value::String(declaration.value.clone()),
                ProvSource::extraction(),
                Stage::Css,
            );
        }
        for declaration in style_outcome
            .declarations
            .iter()
            .filter(|d| d.origin == DeclarationOrigin::Explicit)
        {
            state.provenance.record(
                &path_str,
                &format!("@style:{}", declaration.property),
                Value::String(declaration.value.clone()),
                ProvSource::explicit(),
                Stage::Css,
            );
        }

        let children = self.compile_children(element, &path, state)?;

        Ok(CompiledElement {
            kind: element.kind.clone(),
            path,
            resolved,
            class: class_outcome.class,
            style: style_outcome.style,
            declarations: style_outcome.declarations,
            children,
        })
    }

    fn compile_children(
        &self,
        element: &Element,
        path: &ElementPath,
        state: &mut RunState,
    ) -> Result<Vec<CompiledElement>, CompileError> {
        element
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                self.compile_element(child, path.child(&child.kind, index), state)
            })
            .collect()
    }

    fn effective_options(
        &self,
        element: &Element,
        kind_key: &str,
        path_str: &str,
    ) -> EffectiveOptions {
        let mut component_options = Map::new();
        for system in &self.systems {
            for options in system.scoped_component_options(kind_key, path_str) {
                deep_merge(&mut component_options, options);
            }
        }

        let precedence = PrecedenceContext {
            element_override: Some(&element.props),
            project_config: Some(&self.project_options),
            styling_system_global: Some(&self.system_options),
            component_specific: Some(&component_options),
            defaults: Some(default_options()),
        };
        EffectiveOptions::resolve(&precedence, &self.context.options.precedence_orders)
    }
}

/// Compiles one tree against a context in a single call.
///
/// Convenience over [`Compiler::new`] + [`Compiler::compile`].
pub fn compile(root: &Element, context: &ProjectContext) -> Result<CompileResult, CompileError> {
    Compiler::new(context)?.compile(root)
}
