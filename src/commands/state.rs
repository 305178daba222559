//! `show`, `state rm` and `import`

use anyhow::{Context as _, Result};
use colored::Colorize;
use declarative::{Address, Error, InstanceState, SENSITIVE};

use super::{Session, parse_address};
use crate::Context;
use crate::state::StateFile;
use crate::{paths, resource, ui};

pub fn show(ctx: &Context) -> Result<()> {
    let path = paths::state_file(ctx.state.as_deref())?;
    let state = StateFile::load(&path)?;

    ui::header(&format!(
        "Managed instances ({})",
        state.resources.len()
    ));
    ui::dim(&format!(
        "{} (updated {})",
        path.display(),
        state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if state.resources.is_empty() {
        println!();
        ui::info("Nothing is managed yet. Run `glvar apply` or `glvar import`.");
        return Ok(());
    }

    for (address, instance) in &state.resources {
        println!();
        for line in describe(address, instance) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Lines shown for one instance; sensitive values are redacted.
fn describe(address: &Address, instance: &InstanceState) -> Vec<String> {
    let mut title = address.to_string().bold().to_string();
    if instance.tainted {
        title.push_str(&format!(" {}", "[tainted]".red()));
    }

    let sensitive = resource::sensitive_attributes(&address.resource_type);
    let mut lines = vec![title, format!("  {:<10} {}", "id:".dimmed(), instance.id)];
    for (name, value) in &instance.attributes {
        let shown = match &sensitive {
            Some(names) if !names.contains(name) => value.to_string(),
            _ => SENSITIVE.to_string(),
        };
        lines.push(format!("  {:<10} {shown}", format!("{name}:").dimmed()));
    }
    lines
}

pub fn rm(ctx: &Context, address: &str) -> Result<()> {
    let path = paths::state_file(ctx.state.as_deref())?;
    let mut state = StateFile::load(&path)?;
    let address = parse_address(address)?;

    remove(&mut state, &address)?;
    state.save(&path)?;

    ui::success(&format!("Removed {address} from state"));
    ui::dim("The variable itself was left untouched in GitLab.");
    Ok(())
}

fn remove(state: &mut StateFile, address: &Address) -> Result<InstanceState> {
    state
        .remove(address)
        .with_context(|| format!("{address} is not in state"))
}

pub fn import(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let mut session = Session::open(ctx, false)?;
    let address = parse_address(address)?;
    run_import(&mut session, &address, id)?;

    ui::success(&format!("Imported {address} from {id}"));
    let declared = session.config.desired()?.contains_key(&address);
    if !declared {
        ui::warn(&format!(
            "{address} is not declared in the config; the next apply will destroy it"
        ));
    }
    Ok(())
}

/// Adopt the remote variable behind `id` and save it under `address`.
///
/// Refused when `address` is in state, or when another address of the same
/// type already manages `id`.
pub fn run_import(session: &mut Session, address: &Address, id: &str) -> Result<()> {
    if session.state.get(address).is_some() {
        return Err(Error::AlreadyManaged(address.to_string()).into());
    }
    let owner = session.state.resources.iter().find(|(other, instance)| {
        other.resource_type == address.resource_type && instance.id == id
    });
    if let Some((owner, _)) = owner {
        return Err(Error::DuplicateIdentity {
            address: address.to_string(),
            id: id.to_string(),
            owner: owner.to_string(),
        }
        .into());
    }

    let instance = declarative::import_instance(&session.provider, address, id)?;
    session.state.set(address.clone(), instance);
    session.save()
}
