//! A tiny simulated engine that writes the records a real broker would emit.
//!
//! Each process is modelled as `start -> task -> end`, where `task` is a
//! service task that creates one job. Instances can additionally open
//! message subscriptions.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use bpmn_assert::*;

#[derive(Default)]
struct State {
    next_key: i64,
    versions: HashMap<String, i32>,
    definitions: HashMap<i64, ProcessRecordValue>,
    subscriptions: Vec<ProcessMessageSubscriptionRecordValue>,
    jobs: HashMap<i64, (i64, JobRecordValue)>,
}

impl State {
    fn key(&mut self) -> i64 {
        self.next_key += 1;
        self.next_key
    }
}

#[derive(Clone, Default)]
pub struct Engine {
    log: RecordLog,
    state: Arc<Mutex<State>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &RecordLog {
        &self.log
    }

    pub fn source(&self) -> Source {
        self.log.source()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Deploy processes given as `(bpmn_process_id, resource_name)` pairs.
    pub fn deploy(&self, processes: &[(&str, &str)]) -> DeploymentEvent {
        let mut state = self.state();
        let deployment_key = state.key();
        let definitions: Vec<ProcessRecordValue> = processes
            .iter()
            .map(|(id, resource)| {
                let version = state.versions.entry(id.to_string()).or_default();
                *version += 1;
                let version = *version;
                ProcessRecordValue {
                    bpmn_process_id: id.to_string(),
                    version,
                    process_definition_key: state.key(),
                    resource_name: resource.to_string(),
                }
            })
            .collect();

        self.log.append(Record::new(
            deployment_key,
            DeploymentIntent::Created,
            DeploymentRecordValue {
                resources: definitions.iter().map(|d| d.resource_name.clone()).collect(),
                process_keys: definitions.iter().map(|d| d.process_definition_key).collect(),
            },
        ))
        .unwrap();
        for definition in &definitions {
            self.log.append(Record::new(
                definition.process_definition_key,
                ProcessIntent::Created,
                definition.clone(),
            ))
            .unwrap();
            state
                .definitions
                .insert(definition.process_definition_key, definition.clone());
        }

        DeploymentEvent {
            key: deployment_key,
            processes: definitions.iter().map(ProcessMetadata::from).collect(),
        }
    }

    fn element(
        definition: &ProcessRecordValue,
        process_instance_key: i64,
        element_id: &str,
        element_type: BpmnElementType,
    ) -> ProcessInstanceRecordValue {
        ProcessInstanceRecordValue {
            bpmn_process_id: definition.bpmn_process_id.clone(),
            version: definition.version,
            process_definition_key: definition.process_definition_key,
            process_instance_key,
            element_id: element_id.into(),
            bpmn_element_type: element_type,
            flow_scope_key: if element_type == BpmnElementType::Process {
                Record::UNSET_KEY
            } else {
                process_instance_key
            },
            parent_process_instance_key: Record::UNSET_KEY,
        }
    }

    fn transition(
        &self,
        key: i64,
        value: &ProcessInstanceRecordValue,
        intents: &[ProcessInstanceIntent],
    ) {
        for intent in intents {
            self.log.append(Record::new(key, *intent, value.clone())).unwrap();
        }
    }

    /// Start the latest version of a process and run it up to its service task.
    pub fn create_instance(&self, bpmn_process_id: &str) -> ProcessInstanceEvent {
        use ProcessInstanceIntent::*;

        let mut state = self.state();
        let definition = state
            .definitions
            .values()
            .filter(|d| d.bpmn_process_id == bpmn_process_id)
            .max_by_key(|d| d.version)
            .cloned()
            .unwrap();
        let instance_key = state.key();
        let start_key = state.key();
        let task_key = state.key();
        let job_key = state.key();

        let process = Self::element(
            &definition,
            instance_key,
            bpmn_process_id,
            BpmnElementType::Process,
        );
        self.transition(
            instance_key,
            &process,
            &[ElementActivating, ElementActivated],
        );

        let start = Self::element(
            &definition,
            instance_key,
            "start",
            BpmnElementType::StartEvent,
        );
        self.transition(
            start_key,
            &start,
            &[ElementActivating, ElementActivated, ElementCompleting, ElementCompleted],
        );

        let task = Self::element(
            &definition,
            instance_key,
            "task",
            BpmnElementType::ServiceTask,
        );
        self.transition(task_key, &task, &[ElementActivating, ElementActivated]);

        let job = JobRecordValue {
            job_type: "work".into(),
            process_instance_key: instance_key,
            element_id: "task".into(),
            element_instance_key: task_key,
            bpmn_process_id: definition.bpmn_process_id.clone(),
            process_definition_key: definition.process_definition_key,
            retries: 3,
            ..Default::default()
        };
        self.log.append(Record::new(job_key, JobIntent::Created, job.clone())).unwrap();
        state.jobs.insert(job_key, (task_key, job));

        ProcessInstanceEvent {
            process_instance_key: instance_key,
            process_definition_key: definition.process_definition_key,
            bpmn_process_id: definition.bpmn_process_id,
            version: definition.version,
        }
    }

    /// Hand out the job waiting in the given instance.
    pub fn activate_job(&self, process_instance_key: i64) -> ActivatedJob {
        let state = self.state();
        let (key, (_, job)) = state
            .jobs
            .iter()
            .find(|(_, (_, job))| job.process_instance_key == process_instance_key)
            .unwrap();
        ActivatedJob {
            key: *key,
            job_type: job.job_type.clone(),
            process_instance_key: job.process_instance_key,
            element_id: job.element_id.clone(),
            element_instance_key: job.element_instance_key,
            bpmn_process_id: job.bpmn_process_id.clone(),
            process_definition_key: job.process_definition_key,
            retries: job.retries,
            worker: "test-worker".into(),
            deadline: 0,
        }
    }

    /// Complete the job and run the instance to its end.
    pub fn complete_job(&self, job: &ActivatedJob) {
        use ProcessInstanceIntent::*;

        let mut state = self.state();
        let Some((task_key, value)) = state.jobs.remove(&job.key) else {
            self.log.append(
                Record::new(job.key, JobIntent::Completed, JobRecordValue::default())
                    .rejected(RejectionType::NotFound, "job does not exist"),
            )
            .unwrap();
            return;
        };
        self.log.append(Record::new(job.key, JobIntent::Completed, value)).unwrap();

        let definition = state.definitions[&job.process_definition_key].clone();
        let instance_key = job.process_instance_key;
        let end_key = state.key();

        let task = Self::element(
            &definition,
            instance_key,
            "task",
            BpmnElementType::ServiceTask,
        );
        self.transition(task_key, &task, &[ElementCompleting, ElementCompleted]);

        let end = Self::element(&definition, instance_key, "end", BpmnElementType::EndEvent);
        self.transition(
            end_key,
            &end,
            &[ElementActivating, ElementActivated, ElementCompleting, ElementCompleted],
        );

        let process = Self::element(
            &definition,
            instance_key,
            &definition.bpmn_process_id,
            BpmnElementType::Process,
        );
        self.transition(
            instance_key,
            &process,
            &[ElementCompleting, ElementCompleted],
        );
        state
            .subscriptions
            .retain(|s| s.process_instance_key != instance_key);
    }

    /// Terminate a running instance.
    pub fn cancel_instance(&self, instance: &ProcessInstanceEvent) {
        use ProcessInstanceIntent::*;

        let mut state = self.state();
        let instance_key = instance.process_instance_key;
        let definition = state.definitions[&instance.process_definition_key].clone();
        let waiting: Vec<(i64, i64)> = state
            .jobs
            .iter()
            .filter(|(_, (_, job))| job.process_instance_key == instance_key)
            .map(|(job_key, (task_key, _))| (*job_key, *task_key))
            .collect();

        for (job_key, task_key) in waiting {
            let (_, job) = state.jobs.remove(&job_key).unwrap();
            self.log.append(Record::new(job_key, JobIntent::Canceled, job)).unwrap();
            let task = Self::element(
                &definition,
                instance_key,
                "task",
                BpmnElementType::ServiceTask,
            );
            self.transition(task_key, &task, &[ElementTerminating, ElementTerminated]);
        }

        let process = Self::element(
            &definition,
            instance_key,
            &definition.bpmn_process_id,
            BpmnElementType::Process,
        );
        self.transition(
            instance_key,
            &process,
            &[ElementTerminating, ElementTerminated],
        );
        state
            .subscriptions
            .retain(|s| s.process_instance_key != instance_key);
    }

    /// Open a message subscription for an instance.
    pub fn subscribe(
        &self,
        instance: &ProcessInstanceEvent,
        message_name: &str,
        correlation_key: &str,
    ) {
        let mut state = self.state();
        let key = state.key();
        let subscription = ProcessMessageSubscriptionRecordValue {
            process_instance_key: instance.process_instance_key,
            element_instance_key: instance.process_instance_key,
            message_key: Record::UNSET_KEY,
            message_name: message_name.into(),
            correlation_key: correlation_key.into(),
            bpmn_process_id: instance.bpmn_process_id.clone(),
        };
        self.log.append(Record::new(
            key,
            ProcessMessageSubscriptionIntent::Created,
            subscription.clone(),
        ))
        .unwrap();
        state.subscriptions.push(subscription);
    }

    /// Publish a message and correlate it to every matching open subscription.
    pub fn publish_message(&self, name: &str, correlation_key: &str) -> PublishMessageResponse {
        let mut state = self.state();
        let message_key = state.key();
        self.log.append(Record::new(
            message_key,
            MessageIntent::Published,
            MessageRecordValue {
                name: name.into(),
                correlation_key: correlation_key.into(),
                time_to_live: 60_000,
                ..Default::default()
            },
        ))
        .unwrap();

        let (matching, open): (Vec<_>, Vec<_>) = std::mem::take(&mut state.subscriptions)
            .into_iter()
            .partition(|s| s.message_name == name && s.correlation_key == correlation_key);
        state.subscriptions = open;
        for subscription in matching {
            let key = state.key();
            self.log.append(Record::new(
                key,
                ProcessMessageSubscriptionIntent::Correlated,
                ProcessMessageSubscriptionRecordValue {
                    message_key,
                    ..subscription
                },
            ))
            .unwrap();
        }

        PublishMessageResponse { message_key }
    }

    pub fn expire_message(&self, message: &PublishMessageResponse) {
        self.log.append(Record::new(
            message.message_key,
            MessageIntent::Expired,
            MessageRecordValue::default(),
        ))
        .unwrap();
    }
}
