//! In-process resource used by the runtime's own tests

use crate::data::ResourceData;
use crate::resource::{Resource, import_passthrough};
use crate::schema::{Attribute, Schema};
use crate::types::{Attributes, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

pub fn attrs(name: &str, secret: &str) -> Attributes {
    BTreeMap::from([
        ("name".to_string(), Value::from(name)),
        ("secret".to_string(), Value::from(secret)),
        ("enabled".to_string(), Value::from(false)),
    ])
}

/// Remote store keyed by the `name` attribute.
#[derive(Default)]
pub struct FakeRemote {
    pub objects: Mutex<BTreeMap<String, Attributes>>,
    failing: Mutex<BTreeSet<&'static str>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    /// Make every later call of `op` fail.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    fn check(&self, op: &'static str, name: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("{op}:{name}"));
        if self.failing.lock().unwrap().contains(op) {
            anyhow::bail!("{op} failed for {name}");
        }
        Ok(())
    }

    pub fn insert(&self, attributes: Attributes) {
        let name = attributes["name"].as_str().unwrap().to_string();
        self.objects.lock().unwrap().insert(name, attributes);
    }

    pub fn get(&self, name: &str) -> Option<Attributes> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct FakeResource {
    schema: Schema,
}

impl FakeResource {
    pub fn new() -> Self {
        Self {
            schema: Schema::new()
                .with_attribute(Attribute::required_string("name").force_new())
                .with_attribute(Attribute::required_string("secret").sensitive())
                .with_attribute(Attribute::optional_bool("enabled").with_default(false)),
        }
    }
}

impl Resource for FakeResource {
    type Meta = FakeRemote;

    fn type_name(&self) -> &'static str {
        "fake"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, data: &mut ResourceData, remote: &FakeRemote) -> anyhow::Result<()> {
        let name = data.get_string("name")?;
        remote.check("create", &name)?;
        remote.insert(data.attributes().clone());
        data.set_id(&name);
        remote.check("read_after_create", &name)?;
        self.read(data, remote)
    }

    fn read(&self, data: &mut ResourceData, remote: &FakeRemote) -> anyhow::Result<()> {
        let name = data.id().to_string();
        remote.check("read", &name)?;
        match remote.get(&name) {
            Some(attributes) => {
                for (k, v) in attributes {
                    data.set(&k, v);
                }
            }
            None => data.clear_id(),
        }
        Ok(())
    }

    fn update(&self, data: &mut ResourceData, remote: &FakeRemote) -> anyhow::Result<()> {
        let name = data.id().to_string();
        remote.check("update", &name)?;
        if remote.get(&name).is_none() {
            data.clear_id();
            return Ok(());
        }
        remote.insert(data.attributes().clone());
        self.read(data, remote)
    }

    fn delete(&self, data: &mut ResourceData, remote: &FakeRemote) -> anyhow::Result<()> {
        let name = data.id().to_string();
        remote.check("delete", &name)?;
        if remote.objects.lock().unwrap().remove(&name).is_none() {
            anyhow::bail!("{name} not found");
        }
        Ok(())
    }

    fn import(&self, data: ResourceData, _remote: &FakeRemote) -> anyhow::Result<Vec<ResourceData>> {
        import_passthrough(data)
    }

    fn identity(&self, attributes: &Attributes) -> Option<String> {
        attributes.get("name")?.as_str().map(str::to_string)
    }
}
