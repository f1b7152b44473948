//! Batched installed/running checks for known applications.
//!
//! Each check is a single osascript invocation carrying the full ordered id
//! list. Activating a process per application would multiply the fixed IPC
//! latency by the number of candidates and blow the poll interval, so the
//! repeat loop runs inside the script instead.

use scrobblebar_osa::{split_lines, ScriptBridge};
use tracing::warn;

const APPS_INSTALLED: &str = r#"on run appList
    set results to {}
    repeat with appId in appList
        try
            tell application "Finder" to get application file id appId
            set end of results to true
        on error
            set end of results to false
        end try
    end repeat
    set AppleScript's text item delimiters to linefeed
    return results as text
end run"#;

const APPS_RUNNING: &str = r#"on run appList
    set results to {}
    repeat with appId in appList
        set end of results to (application id appId is running)
    end repeat
    set AppleScript's text item delimiters to linefeed
    return results as text
end run"#;

/// One batched call; results are parallel to `bundle_ids`.
pub async fn check_installed(bridge: &dyn ScriptBridge, bundle_ids: &[&str]) -> Vec<bool> {
    run_batch(bridge, APPS_INSTALLED, bundle_ids).await
}

/// One batched call; results are parallel to `bundle_ids`.
pub async fn check_running(bridge: &dyn ScriptBridge, bundle_ids: &[&str]) -> Vec<bool> {
    run_batch(bridge, APPS_RUNNING, bundle_ids).await
}

async fn run_batch(bridge: &dyn ScriptBridge, source: &str, bundle_ids: &[&str]) -> Vec<bool> {
    if bundle_ids.is_empty() {
        return Vec::new();
    }

    let args: Vec<String> = bundle_ids.iter().map(|id| id.to_string()).collect();
    match bridge.run_script(source, &args).await {
        Ok(output) => {
            let mut flags: Vec<bool> = split_lines(&output)
                .iter()
                .map(|item| item == "true")
                .collect();
            // A short or mangled reply counts the missing tail as absent.
            flags.resize(bundle_ids.len(), false);
            flags
        }
        Err(err) => {
            warn!(error = %err, "batched application check failed; treating all as absent");
            vec![false; bundle_ids.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{check_installed, check_running};
    use crate::testutil::FakeBridge;

    const IDS: [&str; 3] = ["com.example.a", "com.example.b", "com.example.c"];

    #[tokio::test]
    async fn running_check_is_one_call_with_parallel_results() {
        let bridge = FakeBridge::new();
        bridge.push_ok("true\nfalse\ntrue");

        let flags = check_running(&bridge, &IDS).await;

        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(bridge.call_count(), 1);
        let (_, args) = &bridge.calls()[0];
        assert_eq!(args, &IDS.map(String::from).to_vec());
    }

    #[tokio::test]
    async fn installed_check_is_one_call() {
        let bridge = FakeBridge::new();
        bridge.push_ok("false\ntrue\nfalse");

        let flags = check_installed(&bridge, &IDS).await;

        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(bridge.call_count(), 1);
    }

    #[tokio::test]
    async fn whole_batch_failure_degrades_to_all_absent() {
        let bridge = FakeBridge::new();
        bridge.push_err("osascript is not allowed assistive access");

        let flags = check_running(&bridge, &IDS).await;

        assert_eq!(flags, vec![false, false, false]);
    }

    #[tokio::test]
    async fn short_reply_pads_missing_tail_as_absent() {
        let bridge = FakeBridge::new();
        bridge.push_ok("true");

        let flags = check_running(&bridge, &IDS).await;

        assert_eq!(flags, vec![true, false, false]);
    }

    #[tokio::test]
    async fn empty_id_list_skips_the_channel() {
        let bridge = FakeBridge::new();

        let flags = check_running(&bridge, &[]).await;

        assert!(flags.is_empty());
        assert_eq!(bridge.call_count(), 0);
    }
}
