// crates/logforward-broker/src/lib.rs
// ============================================================================
// Module: Broker
// Description: Wires ingestion front ends to the orchestrator and its
//              collaborators.
// Purpose: The crate a binary front end depends on to assemble a working
//          processor from config plus a credential provider.
// Dependencies: logforward-core, logforward-providers, tokio
// ============================================================================

pub mod deliver;
pub mod envelope;
pub mod ingestion;
pub mod orchestrator;
pub mod requeue;
pub mod tenant_resolver;

pub use crate::deliver::DelivererFactory;
pub use crate::deliver::DelivererRegistry;
pub use crate::ingestion::handler::handle_batch;
pub use crate::ingestion::handler::BatchItemFailure;
pub use crate::ingestion::handler::BatchResponse;
pub use crate::ingestion::poller::run_poller;
pub use crate::ingestion::scanner::run_scan;
pub use crate::orchestrator::MessageOutcome;
pub use crate::orchestrator::Orchestrator;
pub use crate::requeue::MAX_RETRY_COUNT;
pub use crate::tenant_resolver::TenantResolver;
