use crate::incident::generate::Generator;
use crate::incident::query::QueryEngine;
use crate::incident::store::IncidentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: IncidentStore,
    pub query: QueryEngine,
    pub generator: Generator,
}
