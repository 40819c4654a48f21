use std::sync::Arc;

use tunebox_resolver::Resolver;

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<dyn Resolver>,
    catalog: Option<Arc<dyn Catalog>>,
}

impl AppState {
    /// `catalog` is `None` when search is not configured.
    pub fn new(resolver: Arc<dyn Resolver>, catalog: Option<Arc<dyn Catalog>>) -> Self {
        Self { resolver, catalog }
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    pub fn catalog(&self) -> Option<&dyn Catalog> {
        self.catalog.as_deref()
    }
}
