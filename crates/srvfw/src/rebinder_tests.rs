// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Binding, Rebinder};
use crate::nameservice::{NameService, NsError};

#[derive(Default)]
struct RecordingNs {
    binds: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl NameService for RecordingNs {
    async fn bind(
        &self,
        binding: &str,
        _descr: &str,
        _extras: &[String],
        _deadline: Duration,
    ) -> Result<(), NsError> {
        if self.fail {
            return Err(NsError::Unreachable("down".into()));
        }
        self.binds.lock().push(binding.to_string());
        Ok(())
    }

    async fn remove(&self, _binding: &str, _deadline: Duration) -> Result<(), NsError> {
        Ok(())
    }
}

fn bindings() -> Vec<Binding> {
    vec![
        Binding { path: "/CQC/A/CoreAdmin".into(), descr: "A".into(), extras: vec![] },
        Binding { path: "/CQC/B/CoreAdmin".into(), descr: "B".into(), extras: vec![] },
    ]
}

#[tokio::test]
async fn binds_immediately_and_reasserts_on_the_interval() {
    let ns = Arc::new(RecordingNs::default());
    let rebinder =
        Rebinder::start(Arc::clone(&ns) as _, bindings(), Duration::from_millis(30));

    tokio::time::sleep(Duration::from_millis(100)).await;
    rebinder.stop().await;

    let binds = ns.binds.lock().clone();
    assert!(binds.len() >= 4, "expected initial + periodic binds, got {}", binds.len());
    assert!(binds.contains(&"/CQC/A/CoreAdmin".to_string()));
    assert!(binds.contains(&"/CQC/B/CoreAdmin".to_string()));
}

#[tokio::test]
async fn stop_halts_reassertion() {
    let ns = Arc::new(RecordingNs::default());
    let rebinder =
        Rebinder::start(Arc::clone(&ns) as _, bindings(), Duration::from_millis(20));
    rebinder.stop().await;

    let count = ns.binds.lock().len();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(ns.binds.lock().len(), count, "no binds after stop");
}

#[tokio::test]
async fn name_service_failures_do_not_kill_the_task() {
    let ns = Arc::new(RecordingNs { fail: true, ..Default::default() });
    let rebinder =
        Rebinder::start(Arc::clone(&ns) as _, bindings(), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(60)).await;
    // Would panic on join error if the task had died
    rebinder.stop().await;
}
