use serde::Serialize;

/// Root of the namespace tree.
///
/// Holds the project namespace every generated type lives under and the
/// service's display name. Child namespaces derive their names from it.
///
/// # Examples
///
/// ```
/// use cmdlet_synth::ServiceNamespace;
///
/// let service = ServiceNamespace::new("Contoso", "ContosoWidgets");
/// assert_eq!(service.child("Models"), "Contoso.Models");
/// assert_eq!(service.service_name(), "ContosoWidgets");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceNamespace {
    name: String,
    service_name: String,
}

impl ServiceNamespace {
    pub fn new(namespace: &str, service_name: &str) -> Self {
        Self {
            name: namespace.to_string(),
            service_name: service_name.to_string(),
        }
    }

    /// Project namespace, e.g. `Contoso`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Full name of a child namespace.
    pub fn child(&self, segment: &str) -> String {
        format!("{}.{}", self.name, segment)
    }
}
