//! Chains completed by performers that write their box from async tasks

use std::time::Duration;

use assert_matches::assert_matches;
use ricochet_core::{
    base_dispatcher, parallel, parallel_async_performer, perform_future, ComposedDispatcher,
    Constant, Delay, Dispatcher, Effect, EffectError, Intent, IntentKey, Performer,
    TypeDispatcher, Value,
};

/// Dispatcher with a tokio-backed `Delay` performer
fn timer_dispatcher() -> Dispatcher {
    let timers = TypeDispatcher::new()
        .with(
            IntentKey::Delay,
            Performer::new(|_, intent, result| {
                let Intent::Delay(delay) = intent else {
                    result.fail(intent.unexpected("Delay"));
                    return Ok(());
                };
                let duration = delay.duration;
                tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    result.succeed(Value::unit());
                });
                Ok(())
            }),
        )
        .with(IntentKey::Parallel, parallel_async_performer());
    ComposedDispatcher::new([timers.into(), base_dispatcher()]).into()
}

fn after(millis: u64, value: i64) -> Effect {
    Effect::new(Delay::new(Duration::from_millis(millis)))
        .on_success(move |_| Ok(Value::effect(Effect::new(Constant::new(value)))))
}

#[tokio::test]
async fn test_chain_resumes_after_timer() {
    let effect = after(5, 10).on_success(|v| Ok(Value::new(v.into_inner::<i64>()? + 1)));
    let value = perform_future(&timer_dispatcher(), effect).await.unwrap();
    assert_eq!(value.into_inner::<i64>().unwrap(), 11);
}

#[tokio::test]
async fn test_parallel_timers_keep_input_order() {
    let effect = parallel([after(30, 1), after(1, 2), after(15, 3)]);
    let value = perform_future(&timer_dispatcher(), effect).await.unwrap();
    let values: Vec<i64> = value
        .into_inner::<Vec<Value>>()
        .unwrap()
        .into_iter()
        .map(|v| v.into_inner::<i64>().unwrap())
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_late_failure_after_first_error_is_discarded() {
    let failing = |millis: u64, message: &'static str| {
        Effect::new(Delay::new(Duration::from_millis(millis)))
            .on_success(move |_| Err(EffectError::failed(message)))
    };
    let effect = parallel([failing(20, "slow"), failing(1, "fast")]);
    let err = perform_future(&timer_dispatcher(), effect).await.unwrap_err();
    assert_matches!(&err, EffectError::FirstError(first) if first.index == 1);
    assert_eq!(err.to_string(), "(index=1) fast");

    // Give the slow child time to finish into the discarded aggregate
    tokio::time::sleep(Duration::from_millis(30)).await;
}
