//! Refresh and import - bring state in line with what the remote reports

use crate::data::ResourceData;
use crate::error::Error;
use crate::resource::{Provider, Resource};
use crate::types::{Address, InstanceState};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Run Read for one instance.
///
/// Returns `None` when the remote object no longer exists.
pub fn refresh_instance<M: Sync>(
    resource: &dyn Resource<Meta = M>,
    state: &InstanceState,
    meta: &M,
) -> Result<Option<InstanceState>> {
    let mut data = ResourceData::from_state(resource.schema(), state);
    resource.read(&mut data, meta)?;

    if data.is_gone() {
        return Ok(None);
    }

    let mut refreshed = data.to_state(resource.type_name());
    refreshed.tainted = state.tainted;
    Ok(Some(refreshed))
}

/// Outcome of refreshing every instance in state.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Instances that still exist, with attributes as just read
    pub state: BTreeMap<Address, InstanceState>,
    /// Instances whose remote object has disappeared
    pub vanished: Vec<Address>,
}

/// Refresh every instance; the first failing Read aborts the run.
pub fn refresh_all<M: Sync>(
    provider: &Provider<M>,
    state: &BTreeMap<Address, InstanceState>,
) -> Result<RefreshReport> {
    let mut report = RefreshReport::default();

    for (address, instance) in state {
        let resource = provider.resource(&address.resource_type)?;
        log::debug!("Refreshing {address}");

        match refresh_instance(resource, instance, provider.meta())
            .with_context(|| format!("Failed to refresh {address}"))?
        {
            Some(refreshed) => {
                report.state.insert(address.clone(), refreshed);
            }
            None => {
                log::warn!("{address} no longer exists remotely; removing from state");
                report.vanished.push(address.clone());
            }
        }
    }

    Ok(report)
}

/// Adopt an existing remote object under `address`.
///
/// Runs the resource's import hook, then Read. An identifier that Read
/// cannot find yields [`Error::ImportNotFound`].
pub fn import_instance<M: Sync>(
    provider: &Provider<M>,
    address: &Address,
    id: &str,
) -> Result<InstanceState> {
    let resource = provider.resource(&address.resource_type)?;
    let mut data = ResourceData::new(resource.schema());
    data.set_id(id);

    let mut imported = resource.import(data, provider.meta())?;
    if imported.len() != 1 {
        anyhow::bail!(
            "import of {address} produced {} instances; expected exactly one",
            imported.len()
        );
    }
    let mut data = imported.remove(0);

    resource.read(&mut data, provider.meta())?;
    if data.is_gone() {
        return Err(Error::ImportNotFound {
            address: address.to_string(),
            id: id.to_string(),
        }
        .into());
    }

    log::info!("Imported {address} (id {id})");
    Ok(data.to_state(resource.type_name()))
}
