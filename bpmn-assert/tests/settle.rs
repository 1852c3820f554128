mod common;

use std::time::Duration;

use bpmn_assert::{
    BpmnElementType, Error, ProcessInstanceIntent, StreamFilter, assert_that,
};
use common::Engine;

#[tokio::test]
async fn settle_then_assert_on_instances_created_by_another_task() -> bpmn_assert::Result {
    let engine = Engine::new();
    let deployment = engine.deploy(&[("looping-task", "looping-task.bpmn")]);
    let source = engine.source();

    let writer = engine.clone();
    let producer = tokio::spawn(async move {
        for _ in 0..2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.create_instance("looping-task");
        }
    });

    engine
        .log()
        .settle_on(|source| {
            StreamFilter::process_instance(source)
                .with_bpmn_process_id("looping-task")
                .with_bpmn_element_type(BpmnElementType::Process)
                .with_intent(ProcessInstanceIntent::ElementActivating)
                .count()
                >= 2
        })
        .within(Duration::from_secs(2))
        .await?;
    producer.await.unwrap();

    assert_that(&deployment, &source)
        .extracting_process_by_bpmn_process_id("looping-task")?
        .has_instances(2)?;
    Ok(())
}

#[tokio::test]
async fn settle_reports_timeout_with_log_size() {
    let engine = Engine::new();
    engine.deploy(&[("order", "order.bpmn")]);

    let err = engine
        .log()
        .settle_on(|source| StreamFilter::job(source).exists())
        .within(Duration::from_millis(30))
        .await
        .unwrap_err();

    assert_eq!(err, Error::SettleTimeout(Duration::from_millis(30), 2));
}
