//! `gitlab_group_variable`: one CI/CD variable scoped to a GitLab group.
//!
//! | Attribute | Type   | Change        | Default |
//! |-----------|--------|---------------|---------|
//! | group     | string | force-replace |         |
//! | key       | string | force-replace |         |
//! | value     | string | in place, sensitive |   |
//! | protected | bool   | in place      | false   |
//!
//! The instance identifier is `group:key` (see [`super::id`]). A 404 from
//! Read or Update means the variable was removed outside glvar: the handler
//! clears the identifier and succeeds so the next plan recreates it. Delete
//! surfaces every error, 404 included.

use super::id;
use anyhow::Result;
use declarative::{Attribute, Attributes, Resource, ResourceData, Schema, import_passthrough};
use gitlab::{Client, CreateVariableOptions, UpdateVariableOptions};

pub const TYPE_NAME: &str = "gitlab_group_variable";

/// Variable attributes as declared, read from the instance handle.
struct Declared {
    group: String,
    key: String,
    value: String,
    protected: bool,
}

impl Declared {
    fn from_data(data: &ResourceData) -> Result<Self> {
        Ok(Self {
            group: data.get_string("group")?,
            key: data.get_string("key")?,
            value: data.get_string("value")?,
            protected: data.get_bool("protected")?,
        })
    }
}

pub struct GroupVariableResource {
    schema: Schema,
}

impl GroupVariableResource {
    pub fn new() -> Self {
        Self {
            schema: Schema::new()
                .with_attribute(
                    Attribute::required_string("group")
                        .force_new()
                        .with_validator(gitlab::validate::group_reference),
                )
                .with_attribute(
                    Attribute::required_string("key")
                        .force_new()
                        .with_validator(gitlab::validate::variable_name),
                )
                .with_attribute(Attribute::required_string("value").sensitive())
                .with_attribute(Attribute::optional_bool("protected").with_default(false)),
        }
    }
}

impl Default for GroupVariableResource {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource for GroupVariableResource {
    type Meta = Client;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, data: &mut ResourceData, client: &Client) -> Result<()> {
        let Declared {
            group,
            key,
            value,
            protected,
        } = Declared::from_data(data)?;
        log::debug!("Creating variable {key} in group {group}");

        client.create_variable(
            &group,
            &CreateVariableOptions {
                key: key.clone(),
                value,
                protected,
            },
        )?;

        data.set_id(id::build(&group, &key));
        self.read(data, client)
    }

    fn read(&self, data: &mut ResourceData, client: &Client) -> Result<()> {
        let (group, key) = id::parse(data.id())?;
        log::debug!("Reading variable {key} in group {group}");

        let variable = match client.get_variable(&group, &key) {
            Ok(variable) => variable,
            Err(e) if e.is_not_found() => {
                log::warn!("Variable {key} not found in group {group}; removing from state");
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        data.set("key", variable.key);
        data.set("value", variable.value);
        data.set("protected", variable.protected);
        data.set("group", group);
        Ok(())
    }

    fn update(&self, data: &mut ResourceData, client: &Client) -> Result<()> {
        let Declared {
            group,
            key,
            value,
            protected,
        } = Declared::from_data(data)?;
        log::debug!("Updating variable {key} in group {group}");

        let opts = UpdateVariableOptions {
            key: key.clone(),
            value,
            protected,
        };
        match client.update_variable(&group, &key, &opts) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                log::warn!("Variable {key} not found in group {group}; removing from state");
                data.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        self.read(data, client)
    }

    fn delete(&self, data: &mut ResourceData, client: &Client) -> Result<()> {
        let group = data.get_string("group")?;
        let key = data.get_string("key")?;
        log::debug!("Deleting variable {key} from group {group}");

        client.remove_variable(&group, &key)?;
        Ok(())
    }

    fn import(&self, data: ResourceData, _client: &Client) -> Result<Vec<ResourceData>> {
        import_passthrough(data)
    }

    fn identity(&self, attributes: &Attributes) -> Option<String> {
        let group = attributes.get("group")?.as_str()?;
        let key = attributes.get("key")?.as_str()?;
        Some(id::build(group, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{
        Action, Address, ApplyResult, Attributes, AutoConfirm, ExecuteOptions, ExecutionPlan,
        InstanceState, NoProgress, Provider, StateChange, Value,
    };
    use gitlab::backend::memory::{Call, MemoryBackend, Operation};
    use gitlab::{GroupVariable, RetryConfig};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct Fixture {
        memory: Arc<MemoryBackend>,
        provider: Provider<Client>,
    }

    impl Fixture {
        fn new() -> Self {
            let memory = Arc::new(MemoryBackend::new());
            let client = Client::with_backend(Box::new(memory.clone()), RetryConfig::no_retry());
            let provider = Provider::new(client).with_resource(GroupVariableResource::new());
            Self { memory, provider }
        }

        fn resource(&self) -> &dyn Resource<Meta = Client> {
            self.provider.resource(TYPE_NAME).unwrap()
        }

        fn client(&self) -> &Client {
            self.provider.meta()
        }

        fn handle(&self, group: &str, key: &str, value: &str, protected: bool) -> ResourceData {
            let attributes = self
                .resource()
                .schema()
                .coerce(&raw(group, key, value, protected))
                .unwrap();
            ResourceData::from_attributes(self.resource().schema(), attributes)
        }

        /// Steady state after creating `mygroup:FOO = bar`, calls cleared.
        fn created(&self) -> ResourceData {
            let mut data = self.handle("mygroup", "FOO", "bar", false);
            self.resource().create(&mut data, self.client()).unwrap();
            self.memory.clear_calls();
            data
        }

        fn plan(
            &self,
            desired: &BTreeMap<Address, Attributes>,
            prior: &BTreeMap<Address, InstanceState>,
        ) -> ExecutionPlan {
            let refreshed = declarative::refresh_all(&self.provider, prior).unwrap();
            ExecutionPlan::build(&self.provider, desired, &refreshed.state).unwrap()
        }

        fn apply(&self, plan: &ExecutionPlan) -> declarative::ExecuteReport {
            declarative::execute(
                &self.provider,
                plan,
                &ExecuteOptions::default(),
                &NoProgress,
                &mut AutoConfirm,
            )
            .unwrap()
        }
    }

    fn raw(group: &str, key: &str, value: &str, protected: bool) -> Attributes {
        BTreeMap::from([
            ("group".to_string(), Value::from(group)),
            ("key".to_string(), Value::from(key)),
            ("value".to_string(), Value::from(value)),
            ("protected".to_string(), Value::from(protected)),
        ])
    }

    fn address() -> Address {
        Address::new(TYPE_NAME, "foo")
    }

    fn state_of(data: &ResourceData) -> BTreeMap<Address, InstanceState> {
        BTreeMap::from([(address(), data.to_state(TYPE_NAME))])
    }

    fn call(operation: Operation, group: &str, key: &str) -> Call {
        Call::new(operation, group, key)
    }

    #[test]
    fn test_schema_shape() {
        let resource = GroupVariableResource::new();
        let schema = resource.schema();
        let force_new: Vec<_> = schema.force_new_attributes().map(|a| a.name).collect();
        assert_eq!(force_new, vec!["group", "key"]);
        assert!(schema.is_sensitive("value"));
        assert!(!schema.is_sensitive("protected"));

        let coerced = schema
            .coerce(&BTreeMap::from([
                ("group".to_string(), Value::from("g")),
                ("key".to_string(), Value::from("K")),
                ("value".to_string(), Value::from("v")),
            ]))
            .unwrap();
        assert_eq!(coerced["protected"], Value::from(false));
    }

    #[test]
    fn test_schema_rejects_invalid_key_and_group() {
        let resource = GroupVariableResource::new();
        let diagnostics = resource
            .schema()
            .coerce(&raw("", "BAD-KEY", "v", false))
            .unwrap_err();
        let attrs: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(attrs, vec!["group", "key"]);
    }

    #[test]
    fn test_same_variable_declared_twice_fails_before_any_call() {
        let fx = Fixture::new();
        let desired = BTreeMap::from([
            (Address::new(TYPE_NAME, "a"), raw("mygroup", "FOO", "one", false)),
            (Address::new(TYPE_NAME, "b"), raw("mygroup", "FOO", "two", true)),
        ]);
        let err = ExecutionPlan::build(&fx.provider, &desired, &BTreeMap::new()).unwrap_err();
        assert!(matches!(
            &err,
            declarative::Error::DuplicateIdentity { id, .. } if id == "mygroup:FOO"
        ));
        assert!(!err.to_string().contains("one"));
        assert!(fx.memory.calls().is_empty());

        // Same key in another group is a different variable.
        let desired = BTreeMap::from([
            (Address::new(TYPE_NAME, "a"), raw("mygroup", "FOO", "one", false)),
            (Address::new(TYPE_NAME, "b"), raw("other", "FOO", "two", false)),
        ]);
        assert!(ExecutionPlan::build(&fx.provider, &desired, &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_invalid_config_fails_before_any_call() {
        let fx = Fixture::new();
        let desired = BTreeMap::from([(address(), raw("mygroup", "has space", "v", false))]);
        let err = ExecutionPlan::build(&fx.provider, &desired, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, declarative::Error::Validation { .. }));
        assert!(fx.memory.calls().is_empty());
    }

    #[test]
    fn test_create_then_read() {
        let fx = Fixture::new();
        let mut data = fx.handle("mygroup", "FOO", "bar", false);

        fx.resource().create(&mut data, fx.client()).unwrap();

        assert_eq!(data.id(), "mygroup:FOO");
        assert_eq!(
            fx.memory.calls(),
            vec![
                call(Operation::Create, "mygroup", "FOO"),
                call(Operation::Get, "mygroup", "FOO"),
            ]
        );
        assert_eq!(data.get_string("group").unwrap(), "mygroup");
        assert_eq!(data.get_string("key").unwrap(), "FOO");
        assert_eq!(data.get_string("value").unwrap(), "bar");
        assert!(!data.get_bool("protected").unwrap());
    }

    #[test]
    fn test_create_failure_sets_no_id() {
        let fx = Fixture::new();
        fx.memory.fail_next(Operation::Create, 400);
        let mut data = fx.handle("mygroup", "FOO", "bar", false);

        let err = fx.resource().create(&mut data, fx.client()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<gitlab::Error>().and_then(gitlab::Error::status_code),
            Some(400)
        );
        assert!(data.is_gone());
        assert_eq!(fx.memory.calls().len(), 1);
    }

    #[test]
    fn test_read_populates_group_from_identifier() {
        let fx = Fixture::new();
        fx.memory.insert(
            "parent/child",
            GroupVariable {
                key: "TOKEN".into(),
                value: "t".into(),
                protected: true,
                variable_type: "env_var".into(),
                masked: false,
                environment_scope: Some("*".into()),
            },
        );
        let mut data = ResourceData::new(fx.resource().schema());
        data.set_id("parent/child:TOKEN");

        fx.resource().read(&mut data, fx.client()).unwrap();
        assert_eq!(data.get_string("group").unwrap(), "parent/child");
        assert!(data.get_bool("protected").unwrap());
    }

    #[test]
    fn test_read_surfaces_other_errors() {
        let fx = Fixture::new();
        let mut data = fx.created();
        fx.memory.fail_next(Operation::Get, 403);

        let err = fx.resource().read(&mut data, fx.client()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<gitlab::Error>().and_then(gitlab::Error::status_code),
            Some(403)
        );
        assert_eq!(data.id(), "mygroup:FOO");
    }

    #[test]
    fn test_update_value() {
        let fx = Fixture::new();
        let mut data = fx.created();
        data.set("value", "baz");

        fx.resource().update(&mut data, fx.client()).unwrap();

        assert_eq!(
            fx.memory.calls(),
            vec![
                call(Operation::Update, "mygroup", "FOO"),
                call(Operation::Get, "mygroup", "FOO"),
            ]
        );
        assert_eq!(data.get_string("value").unwrap(), "baz");
        assert_eq!(data.id(), "mygroup:FOO");
        assert_eq!(fx.memory.variable("mygroup", "FOO").unwrap().value, "baz");
    }

    #[test]
    fn test_update_value_is_planned_in_place() {
        let fx = Fixture::new();
        let data = fx.created();
        let desired = BTreeMap::from([(address(), raw("mygroup", "FOO", "baz", true))]);

        let plan = fx.plan(&desired, &state_of(&data));
        assert_eq!(plan.changes()[0].action, Action::Update);

        let report = fx.apply(&plan);
        assert_eq!(report.summary.modified, 1);
        let variable = fx.memory.variable("mygroup", "FOO").unwrap();
        assert_eq!(variable.value, "baz");
        assert!(variable.protected);
    }

    #[test]
    fn test_key_change_replaces() {
        let fx = Fixture::new();
        let data = fx.created();
        let desired = BTreeMap::from([(address(), raw("mygroup", "QUX", "bar", false))]);

        let plan = fx.plan(&desired, &state_of(&data));
        let change = &plan.changes()[0];
        assert_eq!(change.action, Action::Replace);
        assert!(
            change
                .changes
                .iter()
                .any(|c| c.name == "key" && c.forces_replacement)
        );

        fx.memory.clear_calls();
        let report = fx.apply(&plan);
        assert_eq!(report.summary.replaced, 1);
        assert_eq!(
            fx.memory.calls(),
            vec![
                call(Operation::Remove, "mygroup", "FOO"),
                call(Operation::Create, "mygroup", "QUX"),
                call(Operation::Get, "mygroup", "QUX"),
            ]
        );
        match &report.outcomes[0].state {
            StateChange::Set(state) => assert_eq!(state.id, "mygroup:QUX"),
            other => panic!("unexpected state change: {other:?}"),
        }
        assert!(fx.memory.variable("mygroup", "FOO").is_none());
    }

    #[test]
    fn test_group_change_replaces() {
        let fx = Fixture::new();
        let data = fx.created();
        let desired = BTreeMap::from([(address(), raw("othergroup", "FOO", "bar", false))]);

        let plan = fx.plan(&desired, &state_of(&data));
        assert_eq!(plan.changes()[0].action, Action::Replace);
    }

    #[test]
    fn test_read_of_deleted_variable_clears_id() {
        let fx = Fixture::new();
        let mut data = fx.created();
        let before = data.attributes().clone();
        fx.memory.remove_out_of_band("mygroup", "FOO");

        fx.resource().read(&mut data, fx.client()).unwrap();
        assert!(data.is_gone());
        assert_eq!(data.attributes(), &before);
    }

    #[test]
    fn test_deleted_variable_is_recreated_by_next_plan() {
        let fx = Fixture::new();
        let data = fx.created();
        fx.memory.remove_out_of_band("mygroup", "FOO");
        let desired = BTreeMap::from([(address(), raw("mygroup", "FOO", "bar", false))]);

        let plan = fx.plan(&desired, &state_of(&data));
        assert_eq!(plan.changes()[0].action, Action::Create);
    }

    #[test]
    fn test_update_of_deleted_variable_clears_id() {
        let fx = Fixture::new();
        let mut data = fx.created();
        data.set("value", "baz");
        fx.memory.remove_out_of_band("mygroup", "FOO");

        fx.resource().update(&mut data, fx.client()).unwrap();
        assert!(data.is_gone());
        assert_eq!(
            fx.memory.calls(),
            vec![call(Operation::Update, "mygroup", "FOO")]
        );
    }

    #[test]
    fn test_update_surfaces_other_errors() {
        let fx = Fixture::new();
        let mut data = fx.created();
        fx.memory.fail_next(Operation::Update, 403);

        assert!(fx.resource().update(&mut data, fx.client()).is_err());
        assert_eq!(data.id(), "mygroup:FOO");
    }

    #[test]
    fn test_malformed_import() {
        let fx = Fixture::new();
        let err =
            declarative::import_instance(&fx.provider, &address(), "no-separator-here").unwrap_err();
        assert_eq!(
            err.downcast_ref::<id::IdError>(),
            Some(&id::IdError::Malformed("no-separator-here".into()))
        );
        assert!(fx.memory.calls().is_empty());
    }

    #[test]
    fn test_import_existing_variable() {
        let fx = Fixture::new();
        fx.created();

        let state = declarative::import_instance(&fx.provider, &address(), "mygroup:FOO").unwrap();
        assert_eq!(state.id, "mygroup:FOO");
        assert_eq!(state.attributes["value"], Value::from("bar"));
        assert_eq!(state.attributes["group"], Value::from("mygroup"));
    }

    #[test]
    fn test_import_missing_variable() {
        let fx = Fixture::new();
        let err = declarative::import_instance(&fx.provider, &address(), "mygroup:NOPE").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<declarative::Error>(),
            Some(declarative::Error::ImportNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_success_removes_state() {
        let fx = Fixture::new();
        let data = fx.created();

        let plan = fx.plan(&BTreeMap::new(), &state_of(&data));
        assert_eq!(plan.changes()[0].action, Action::Delete);

        let report = fx.apply(&plan);
        assert_eq!(report.outcomes[0].result, ApplyResult::Removed);
        assert_eq!(report.outcomes[0].state, StateChange::Remove);
        assert!(fx.memory.is_empty());
    }

    #[test]
    fn test_delete_error_retains_state() {
        let fx = Fixture::new();
        let data = fx.created();
        let plan = fx.plan(&BTreeMap::new(), &state_of(&data));
        fx.memory.fail_next(Operation::Remove, 403);

        let report = fx.apply(&plan);
        assert!(matches!(report.outcomes[0].result, ApplyResult::Failed { .. }));
        assert_eq!(report.outcomes[0].state, StateChange::Unchanged);
        assert!(fx.memory.variable("mygroup", "FOO").is_some());
    }

    #[test]
    fn test_delete_not_found_is_surfaced() {
        let fx = Fixture::new();
        let mut data = fx.created();
        fx.memory.remove_out_of_band("mygroup", "FOO");

        let err = fx.resource().delete(&mut data, fx.client()).unwrap_err();
        assert!(
            err.downcast_ref::<gitlab::Error>()
                .is_some_and(gitlab::Error::is_not_found)
        );
    }

    mod sensitivity {
        use super::*;
        use std::sync::{Mutex, Once};

        const SECRET: &str = "sentinel-9f2c-do-not-log";

        static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());
        static INIT: Once = Once::new();

        struct Capture;

        static CAPTURE: Capture = Capture;

        impl log::Log for Capture {
            fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
                true
            }

            fn log(&self, record: &log::Record<'_>) {
                LINES
                    .lock()
                    .unwrap()
                    .push(format!("{} {}", record.target(), record.args()));
            }

            fn flush(&self) {}
        }

        fn capture_logs() {
            INIT.call_once(|| {
                log::set_logger(&CAPTURE).unwrap();
                log::set_max_level(log::LevelFilter::Trace);
            });
        }

        #[test]
        fn test_value_never_logged_or_displayed() {
            capture_logs();
            let fx = Fixture::new();

            let desired = BTreeMap::from([(address(), raw("mygroup", "FOO", SECRET, false))]);
            let plan = fx.plan(&desired, &BTreeMap::new());
            let mut rendered: Vec<String> = plan
                .changes()
                .iter()
                .flat_map(|c| c.changes.iter().map(ToString::to_string))
                .collect();
            rendered.push(format!("{plan:?}"));

            let report = fx.apply(&plan);
            let state = match &report.outcomes[0].state {
                StateChange::Set(state) => state.clone(),
                other => panic!("unexpected state change: {other:?}"),
            };
            let data = ResourceData::from_state(fx.resource().schema(), &state);
            rendered.push(format!("{data:?}"));

            // Exercise the error paths with the secret in flight.
            let mut failing = data.clone();
            fx.memory.fail_next(Operation::Update, 500);
            let err = fx.resource().update(&mut failing, fx.client()).unwrap_err();
            rendered.push(format!("{err:#}"));
            rendered.push(format!("{err:?}"));

            let mut dup = fx.handle("mygroup", "FOO", SECRET, false);
            let err = fx.resource().create(&mut dup, fx.client()).unwrap_err();
            rendered.push(format!("{err:#}"));

            let mut gone = data;
            fx.memory.remove_out_of_band("mygroup", "FOO");
            fx.resource().read(&mut gone, fx.client()).unwrap();

            for line in rendered.iter().chain(LINES.lock().unwrap().iter()) {
                assert!(!line.contains(SECRET), "secret leaked: {line}");
            }
        }
    }
}
