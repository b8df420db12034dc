//! Service directory handler.

use conductor_core::{RequestContext, Store, COMPUTE_TOPIC};

use crate::convert::convert_result;
use crate::normalize::to_primitive_all;
use crate::operation::Operation;
use crate::{Output, Result};

/// Which store query a service lookup maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceQuery<'a> {
    /// Neither filter given
    All,
    /// Both given with the compute topic: compute services joined with
    /// their nodes
    ComputeByHost(&'a str),
    /// Both given with any other topic
    HostAndTopic { host: &'a str, topic: &'a str },
    /// Topic only
    Topic(&'a str),
    /// Host only
    Host(&'a str),
}

impl<'a> ServiceQuery<'a> {
    /// Pick the query. Empty strings count as absent, and the combined
    /// filter takes priority over either single one.
    pub fn select(topic: Option<&'a str>, host: Option<&'a str>) -> Self {
        let topic = topic.filter(|t| !t.is_empty());
        let host = host.filter(|h| !h.is_empty());
        match (topic, host) {
            (None, None) => ServiceQuery::All,
            (Some(COMPUTE_TOPIC), Some(host)) => ServiceQuery::ComputeByHost(host),
            (Some(topic), Some(host)) => ServiceQuery::HostAndTopic { host, topic },
            (Some(topic), None) => ServiceQuery::Topic(topic),
            (None, Some(host)) => ServiceQuery::Host(host),
        }
    }
}

/// Handle ServiceGetAllBy command.
///
/// The host-and-topic lookup finds at most one service; it is returned as a
/// sequence of zero or one so every branch has the same shape.
pub fn service_get_all_by(
    store: &dyn Store,
    ctx: &RequestContext,
    topic: Option<&str>,
    host: Option<&str>,
) -> Result<Output> {
    let query = ServiceQuery::select(topic, host);
    tracing::debug!(target: "conductor::executor", ?query, "Service lookup");
    let services = convert_result(
        Operation::ServiceGetAllBy,
        match query {
            ServiceQuery::All => store.service_get_all(ctx),
            ServiceQuery::ComputeByHost(host) => store.service_get_all_compute_by_host(ctx, host),
            ServiceQuery::HostAndTopic { host, topic } => store
                .service_get_by_host_and_topic(ctx, host, topic)
                .map(|found| found.into_iter().collect::<Vec<_>>()),
            ServiceQuery::Topic(topic) => store.service_get_all_by_topic(ctx, topic),
            ServiceQuery::Host(host) => store.service_get_all_by_host(ctx, host),
        },
    )?;
    Ok(Output::Values(to_primitive_all(&services)?))
}
