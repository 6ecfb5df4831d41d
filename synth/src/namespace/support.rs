use serde::Serialize;
use tracing::debug;

use super::{Definition, Namespace, ServiceNamespace};
use crate::error::Result;
use crate::resolver::TypeResolver;

/// A runtime-support type shared by every other namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportTypeDefinition {
    pub name: String,
    pub full_name: String,
    /// Declaration generated code uses to refer to the type.
    pub declaration: String,
    /// Schema kind it stands in for.
    pub replaces: String,
}

impl Definition for SupportTypeDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

/// `{ns}.Support`: one definition per override that introduces a
/// runtime-support type.
#[derive(Debug, Clone)]
pub struct SupportNamespace {
    namespace: Namespace<SupportTypeDefinition>,
}

impl SupportNamespace {
    pub fn new(service: &ServiceNamespace, resolver: &TypeResolver) -> Result<Self> {
        let mut namespace = Namespace::new(&service.child("Support"));
        namespace.begin()?;
        for support in resolver.overrides().iter().filter_map(|o| o.support()) {
            debug!(name = %support.name, "support type defined");
            namespace.insert(SupportTypeDefinition {
                name: support.name.clone(),
                full_name: format!("{}.{}", namespace.full_name(), support.name),
                declaration: support.declaration.clone(),
                replaces: support.replaces.clone(),
            })?;
        }
        namespace.finalize()?;
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &Namespace<SupportTypeDefinition> {
        &self.namespace
    }
}
