use std::io::Write;

use slotmap::SlotMap;
use time::OffsetDateTime;
use vcdtrace_core::{IdentifierGenerator, VarDescriptor, VarKind};

use super::{runtime, BuilderError, BuilderScopeKey, ScopeBuilder, ScopeBuilderState, TraceScope, VarPath};

mod header;

pub use header::format_date;

/// Collects the scope tree and the values bound into it, until [`TraceBuilder::finalize_header`]
/// writes the header and hands the registry over to a [`runtime::Tracer`].
#[derive(Debug)]
pub struct TraceBuilder {
    /// Builders for Scopes
    pub(super) scopes: SlotMap<BuilderScopeKey, ScopeBuilder>,
    /// The root scope
    root: BuilderScopeKey,
    /// Allocator for the short identifiers
    identifiers: IdentifierGenerator,
    /// Renderers of all bound values
    registry: runtime::Registry,
    config: runtime::Config,
}

impl TraceBuilder {
    /// Create a builder whose root scope is named `root_name`.
    pub fn new(root_name: &str) -> Self {
        Self::with_config(root_name, runtime::Config::default())
    }

    pub fn with_config(root_name: &str, config: runtime::Config) -> Self {
        let mut scopes = SlotMap::with_key();
        let root = scopes.insert(ScopeBuilder::new(root_name, None));
        Self {
            scopes,
            root,
            identifiers: IdentifierGenerator::new(),
            registry: runtime::Registry::new(),
            config,
        }
    }

    pub fn root(&self) -> BuilderScopeKey {
        self.root
    }

    pub fn config(&self) -> &runtime::Config {
        &self.config
    }

    /// Number of values bound so far.
    pub fn num_values(&self) -> usize {
        self.registry.len()
    }

    /// Add a new scope below `parent`.
    pub fn add_scope(
        &mut self,
        name: &str,
        parent: BuilderScopeKey,
    ) -> Result<BuilderScopeKey, BuilderError> {
        let parent_path = self.scope_path(parent)?;
        // Ensure no duplicate names below the same parent
        if self.scopes[parent]
            .children
            .iter()
            .any(|child| self.scopes[*child].name == name)
        {
            return Err(BuilderError::DuplicateScopeDefinition {
                parent_path: parent_path.to_string(),
                scope_name: name.to_owned(),
            });
        }
        let path = parent_path.append(name)?;

        let key = self.scopes.insert(ScopeBuilder::new(name, Some(parent)));
        self.scopes[parent].children.push(key);
        tracing::trace!(%path, "Added scope.");
        Ok(key)
    }

    /// Get a [`ScopeBuilderState`] for a previously added scope
    pub fn scope(&mut self, key: BuilderScopeKey) -> Result<ScopeBuilderState<'_>, BuilderError> {
        if !self.scopes.contains_key(key) {
            return Err(BuilderError::ScopeKeyNotFound(key));
        }
        Ok(ScopeBuilderState::new(key, self))
    }

    /// Add a child scope below `parent` and let `S` populate it.
    pub fn add_child<S: TraceScope>(
        &mut self,
        name: &str,
        parent: BuilderScopeKey,
    ) -> Result<S, BuilderError> {
        let key = self.add_scope(name, parent)?;
        S::build(&mut ScopeBuilderState::new(key, self))
    }

    pub(crate) fn scope_name(&self, key: BuilderScopeKey) -> Option<&str> {
        self.scopes.get(key).map(|scope| scope.name.as_str())
    }

    /// The dotted path of a scope, from the root.
    pub fn scope_path(&self, key: BuilderScopeKey) -> Result<VarPath, BuilderError> {
        let mut names = Vec::new();
        let mut next = Some(key);
        while let Some(key) = next {
            let scope = self
                .scopes
                .get(key)
                .ok_or(BuilderError::ScopeKeyNotFound(key))?;
            names.push(scope.name.as_str());
            next = scope.parent;
        }
        let mut names = names.into_iter().rev();
        let root = names
            .next()
            .ok_or(BuilderError::ScopeKeyNotFound(key))?;
        names.try_fold(VarPath::new(root)?, |path, name| path.append(name))
    }

    /// Find a scope given its dotted path
    pub fn find_scope_by_path<T>(&self, scope_path: T) -> Result<BuilderScopeKey, BuilderError>
    where
        T: TryInto<VarPath>,
        T::Error: Into<BuilderError>,
    {
        let scope_path: VarPath = scope_path.try_into().map_err(Into::into)?;
        let mut segments = scope_path.segments();
        let mut current = self.root;
        if segments.next() != Some(self.scopes[self.root].name.as_str()) {
            return Err(BuilderError::NamedScopeNotFound(scope_path.to_string()));
        }
        for segment in segments {
            current = self.scopes[current]
                .children
                .iter()
                .copied()
                .find(|child| self.scopes[*child].name == segment)
                .ok_or_else(|| BuilderError::NamedScopeNotFound(scope_path.to_string()))?;
        }
        Ok(current)
    }

    /// Register a renderer under `name` in `scope`, allocating its identifier and adding its
    /// `$var` line to the scope.
    pub fn bind_value(
        &mut self,
        scope: BuilderScopeKey,
        name: &str,
        kind: VarKind,
        width: u32,
        renderer: Box<dyn runtime::Renderable>,
    ) -> Result<runtime::Binding, BuilderError> {
        let path = self.scope_path(scope)?.append(name)?.to_string();
        if self.registry.contains_path(&path) {
            return Err(BuilderError::DuplicateVarDefinition(path));
        }

        let identifier = self.identifiers.allocate()?;
        let descriptor = VarDescriptor {
            name: name.to_owned(),
            path,
            width,
            kind,
            identifier: identifier.clone(),
        };
        tracing::trace!(%descriptor, path = %descriptor.path, "Bound value.");

        let header = &mut self.scopes[scope].header;
        header.push_str(&descriptor.to_string());
        header.push('\n');

        let key = self.registry.insert(descriptor, renderer);
        Ok(runtime::Binding { key, identifier })
    }

    /// Bind an existing value to `scope` under `name`.
    pub fn elaborate(
        &mut self,
        scope: BuilderScopeKey,
        value: &mut dyn runtime::Traceable,
        name: &str,
    ) -> Result<runtime::Binding, BuilderError> {
        if let Some(binding) = value.binding() {
            return Err(BuilderError::AlreadyBound {
                name: name.to_owned(),
                identifier: binding.identifier,
            });
        }
        let binding =
            self.bind_value(scope, name, value.kind(), value.width(), value.renderer())?;
        value.attach(binding.clone());
        Ok(binding)
    }

    /// Build a value and bind it to `scope` under `name`.
    pub fn add_value<T: runtime::TraceData>(
        &mut self,
        scope: BuilderScopeKey,
        name: &str,
        builder: runtime::ValueBuilder<T>,
    ) -> Result<runtime::Value<T>, BuilderError> {
        let mut value = builder.build()?;
        self.elaborate(scope, &mut value, name)?;
        Ok(value)
    }

    /// Write the complete header, the initial `#0` marker and the power-up state of every value,
    /// and return the [`runtime::Tracer`] for the rest of the trace.
    #[tracing::instrument(skip(self, out))]
    pub fn finalize_header(
        mut self,
        out: &mut dyn Write,
        date: OffsetDateTime,
    ) -> Result<runtime::Tracer, BuilderError> {
        header::write_preamble(out, &self.config, date)?;
        let scopes = self.take_scope(self.root)?;
        out.write_all(scopes.as_bytes())?;
        writeln!(out, "$enddefinitions $end")?;

        tracing::info!(
            values = self.registry.len(),
            identifier_digits = self.identifiers.digits(),
            "Header finalized."
        );

        let mut tracer = runtime::Tracer::new(self.registry, self.config);
        tracer.start(out)?;
        Ok(tracer)
    }

    /// Render a scope and all of its descendants, releasing them from the builder.
    fn take_scope(&mut self, key: BuilderScopeKey) -> Result<String, BuilderError> {
        let scope = self
            .scopes
            .remove(key)
            .ok_or(BuilderError::ScopeKeyNotFound(key))?;
        let mut text = format!("$scope module {} $end\n{}", scope.name, scope.header);
        for child in scope.children {
            text.push_str(&self.take_scope(child)?);
        }
        text.push_str("$upscope $end\n");
        Ok(text)
    }
}
