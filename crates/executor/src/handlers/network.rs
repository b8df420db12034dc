//! Security group, firewall and agent build handlers.

use conductor_core::{RequestContext, Store};

use crate::convert::convert_result;
use crate::normalize::{to_primitive, to_primitive_all};
use crate::operation::Operation;
use crate::{Output, Result};

/// Handle SecurityGroupGetByInstance command.
pub fn security_group_get_by_instance(
    store: &dyn Store,
    ctx: &RequestContext,
    instance_id: i64,
) -> Result<Output> {
    let groups = convert_result(
        Operation::SecurityGroupGetByInstance,
        store.security_group_get_by_instance(ctx, instance_id),
    )?;
    Ok(Output::Values(to_primitive_all(&groups)?))
}

/// Handle SecurityGroupRuleGetBySecurityGroup command.
pub fn security_group_rule_get_by_security_group(
    store: &dyn Store,
    ctx: &RequestContext,
    security_group_id: i64,
) -> Result<Output> {
    let rules = convert_result(
        Operation::SecurityGroupRuleGetBySecurityGroup,
        store.security_group_rule_get_by_security_group(ctx, security_group_id),
    )?;
    Ok(Output::Values(to_primitive_all(&rules)?))
}

/// Handle ProviderFwRuleGetAll command.
pub fn provider_fw_rule_get_all(store: &dyn Store, ctx: &RequestContext) -> Result<Output> {
    let rules = convert_result(
        Operation::ProviderFwRuleGetAll,
        store.provider_fw_rule_get_all(ctx),
    )?;
    Ok(Output::Values(to_primitive_all(&rules)?))
}

/// Handle AgentBuildGetByTriple command.
pub fn agent_build_get_by_triple(
    store: &dyn Store,
    ctx: &RequestContext,
    hypervisor: &str,
    os: &str,
    architecture: &str,
) -> Result<Output> {
    let build = convert_result(
        Operation::AgentBuildGetByTriple,
        store.agent_build_get_by_triple(ctx, hypervisor, os, architecture),
    )?;
    Ok(Output::Maybe(build.as_ref().map(to_primitive).transpose()?))
}
