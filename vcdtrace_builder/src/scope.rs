use crate::{runtime, BuilderError, TraceBuilder, VarPath};

slotmap::new_key_type! {
    pub struct BuilderScopeKey;
}

/// A user type that declares the values (and nested scopes) of one named scope.
pub trait TraceScope: Sized {
    fn build(scope: &mut ScopeBuilderState<'_>) -> Result<Self, BuilderError>;
}

/// Builder-side definition of one `$scope module` block. Only lives until the header is written.
#[derive(Debug)]
pub(crate) struct ScopeBuilder {
    /// The local name of the scope
    pub name: String,
    /// Parent scope, used to compute paths during elaboration
    pub parent: Option<BuilderScopeKey>,
    /// Child scopes in insertion order
    pub children: Vec<BuilderScopeKey>,
    /// `$var` lines of the values bound directly to this scope
    pub header: String,
}

impl ScopeBuilder {
    pub fn new(name: &str, parent: Option<BuilderScopeKey>) -> Self {
        Self {
            name: name.to_owned(),
            parent,
            children: Vec::new(),
            header: String::new(),
        }
    }
}

/// Builder struct used to add values and child scopes to one scope.
pub struct ScopeBuilderState<'a> {
    scope_key: BuilderScopeKey,
    env: &'a mut TraceBuilder,
}

impl<'a> ScopeBuilderState<'a> {
    pub(crate) fn new(scope_key: BuilderScopeKey, env: &'a mut TraceBuilder) -> Self {
        Self { scope_key, env }
    }

    /// Get the [`BuilderScopeKey`] for this scope
    pub fn key(&self) -> BuilderScopeKey {
        self.scope_key
    }

    pub fn name(&self) -> &str {
        self.env.scope_name(self.scope_key).unwrap_or_default()
    }

    pub fn path(&self) -> Result<VarPath, BuilderError> {
        self.env.scope_path(self.scope_key)
    }

    /// Add an empty child scope.
    pub fn add_child_scope(&mut self, name: &str) -> Result<BuilderScopeKey, BuilderError> {
        self.env.add_scope(name, self.scope_key)
    }

    /// Add a child scope and let `S` populate it.
    pub fn add_child<S: TraceScope>(&mut self, name: &str) -> Result<S, BuilderError> {
        let child_key = self.env.add_scope(name, self.scope_key)?;
        S::build(&mut ScopeBuilderState::new(child_key, self.env))
    }

    /// Bind an existing value to this scope under `name`.
    pub fn elaborate(
        &mut self,
        value: &mut impl runtime::Traceable,
        name: &str,
    ) -> Result<runtime::Binding, BuilderError> {
        self.env.elaborate(self.scope_key, value, name)
    }

    /// Build a value and bind it to this scope under `name`.
    pub fn add_value<T: runtime::TraceData>(
        &mut self,
        name: &str,
        builder: runtime::ValueBuilder<T>,
    ) -> Result<runtime::Value<T>, BuilderError> {
        self.env.add_value(self.scope_key, name, builder)
    }

    pub fn finish(self) -> BuilderScopeKey {
        self.scope_key
    }
}
