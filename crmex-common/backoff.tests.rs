use super::*;

#[test]
fn grows_up_to_max_delay_test() {
    let mut backoff = ResettableBackoff::new(Duration::from_millis(100), Duration::from_millis(400), false);

    assert_eq!(Some(Duration::from_millis(100)), backoff.next_backoff());
    assert_eq!(Some(Duration::from_millis(200)), backoff.next_backoff());
    assert_eq!(Some(Duration::from_millis(400)), backoff.next_backoff());
    assert_eq!(Some(Duration::from_millis(400)), backoff.next_backoff());
}

#[test]
fn reset_starts_over_test() {
    let mut backoff = ResettableBackoff::new(Duration::from_millis(100), Duration::from_secs(1), false);
    backoff.next_backoff();
    backoff.next_backoff();

    backoff.reset();

    assert_eq!(Some(Duration::from_millis(100)), backoff.next_backoff());
}
