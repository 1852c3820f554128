//! Order Flow Example - asserting on an engine's record stream
//!
//! A background task plays the part of the engine: it deploys an `order`
//! process, starts an instance that waits for a `payment-received` message,
//! and correlates the message once it is published.
//!
//! The test side only holds the responses and the record source. It settles
//! on the log, then chains assertions.
//!
//! Run with `cargo run --example order_flow`.

use std::time::Duration;

use bpmn_assert::*;

const DEPLOYMENT_KEY: i64 = 1;
const DEFINITION_KEY: i64 = 2;
const INSTANCE_KEY: i64 = 3;
const SUBSCRIPTION_KEY: i64 = 4;
const MESSAGE_KEY: i64 = 5;

// ============================================================================
// Simulated engine
// ============================================================================

fn definition() -> ProcessRecordValue {
    ProcessRecordValue {
        bpmn_process_id: "order".into(),
        version: 1,
        process_definition_key: DEFINITION_KEY,
        resource_name: "order.bpmn".into(),
    }
}

fn instance_element(element_id: &str, element_type: BpmnElementType) -> ProcessInstanceRecordValue {
    ProcessInstanceRecordValue {
        bpmn_process_id: "order".into(),
        version: 1,
        process_definition_key: DEFINITION_KEY,
        process_instance_key: INSTANCE_KEY,
        element_id: element_id.into(),
        bpmn_element_type: element_type,
        flow_scope_key: Record::UNSET_KEY,
        parent_process_instance_key: Record::UNSET_KEY,
    }
}

fn subscription(message_key: i64) -> ProcessMessageSubscriptionRecordValue {
    ProcessMessageSubscriptionRecordValue {
        process_instance_key: INSTANCE_KEY,
        element_instance_key: INSTANCE_KEY,
        message_key,
        message_name: "payment-received".into(),
        correlation_key: "order-17".into(),
        bpmn_process_id: "order".into(),
    }
}

async fn run_engine(log: RecordLog) -> Result {
    use ProcessInstanceIntent::*;

    log.append(Record::new(
        DEPLOYMENT_KEY,
        DeploymentIntent::Created,
        DeploymentRecordValue {
            resources: vec!["order.bpmn".into()],
            process_keys: vec![DEFINITION_KEY],
        },
    ))?;
    log.append(Record::new(DEFINITION_KEY, ProcessIntent::Created, definition()))?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let process = instance_element("order", BpmnElementType::Process);
    for intent in [ElementActivating, ElementActivated] {
        log.append(Record::new(INSTANCE_KEY, intent, process.clone()))?;
    }
    log.append(Record::new(
        SUBSCRIPTION_KEY,
        ProcessMessageSubscriptionIntent::Created,
        subscription(Record::UNSET_KEY),
    ))?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    log.append(Record::new(
        MESSAGE_KEY,
        MessageIntent::Published,
        MessageRecordValue {
            name: "payment-received".into(),
            correlation_key: "order-17".into(),
            ..Default::default()
        },
    ))?;
    log.append(Record::new(
        SUBSCRIPTION_KEY,
        ProcessMessageSubscriptionIntent::Correlated,
        subscription(MESSAGE_KEY),
    ))?;
    Ok(())
}

// ============================================================================
// Assertions
// ============================================================================

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let log = RecordLog::with_config(Config::default().with_settle_timeout(Duration::from_secs(2)));
    let source = log.source();
    let engine = tokio::spawn(run_engine(log.clone()));

    let deployment = DeploymentEvent {
        key: DEPLOYMENT_KEY,
        processes: vec![ProcessMetadata::from(&definition())],
    };
    let message = PublishMessageResponse {
        message_key: MESSAGE_KEY,
    };

    log.settle_on(|source| {
        StreamFilter::process_message_subscription(source)
            .with_message_key(MESSAGE_KEY)
            .with_intent(ProcessMessageSubscriptionIntent::Correlated)
            .exists()
    })
    .await?;
    match engine.await {
        Ok(result) => result?,
        Err(e) => eprintln!("engine task failed: {e}"),
    }

    assert_that(&deployment, &source)
        .contains_processes_by_bpmn_process_id(&["order"])?
        .extracting_process_by_bpmn_process_id("order")?
        .has_version(1)?
        .has_instances(1)?;

    let instance = assert_that(message, &source)
        .has_been_correlated()?
        .has_not_expired()?
        .extracting_process_instance()?;
    instance
        .is_active()?
        .has_correlated_message_by_name("payment-received", 1)?;

    // A failed check carries the diagnostic and leaves the log untouched
    if let Err(e) = instance.is_completed() {
        println!("expected failure: {e}");
    }

    println!("{} records checked", log.len());
    Ok(())
}
