//! Tests for the rollback state machine

#[cfg(test)]
mod tests {
    use crate::install::tests::helpers::{FakeHost, FakeInstaller};
    use crate::install::traits::PluginHost;
    use crate::rollback::request::RollbackErrorCode;
    use crate::rollback::tests::helpers::{catalog_payload, Harness, BASENAME};
    use crate::updater::tests::helpers::FakeFetcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_target_version() {
        let mut harness = Harness::active();
        let request = harness.request("1.9.0");
        let result = harness.run(&request).await;

        assert!(!result.success);
        assert_eq!(result.error_code, Some(RollbackErrorCode::NoTargetVersion));
        assert_eq!(harness.installer.runs, 0);
        assert_eq!(harness.host.deactivations(), 0);
    }

    #[tokio::test]
    async fn test_catalog_hidden_when_rollback_not_allowed() {
        let mut payload = catalog_payload();
        payload["allow_rollback"] = json!("no");
        let mut harness = Harness::new(FakeFetcher::answering(payload), FakeHost::with_active(BASENAME));

        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;
        assert_eq!(result.error_code, Some(RollbackErrorCode::NoTargetVersion));
        assert_eq!(harness.installer.runs, 0);
    }

    #[tokio::test]
    async fn test_unreachable_server_means_no_target_version() {
        let mut harness = Harness::new(FakeFetcher::failing(), FakeHost::with_active(BASENAME));
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        assert_eq!(result.error_code, Some(RollbackErrorCode::NoTargetVersion));
        assert_eq!(harness.installer.runs, 0);
    }

    #[tokio::test]
    async fn test_active_plugin_reactivated_once() {
        let mut harness = Harness::active();
        harness.seed_cache();
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        assert!(result.success, "{}", result.message);
        assert_eq!(result.error_code, None);
        assert_eq!(result.current_version, "2.0.0");
        assert_eq!(result.target_version, "1.8.0");
        assert_eq!(
            harness.installer.packages,
            vec!["https://updates.acme.test/packages/1.8.0.zip".to_string()]
        );
        assert_eq!(harness.host.activations(), 1);
        assert!(harness.host.is_active(BASENAME).unwrap());
        assert!(!harness.cached(), "cache entry must be invalidated");
        assert!(result.debug_trace.is_none());
    }

    #[tokio::test]
    async fn test_inactive_plugin_never_reactivated() {
        let mut harness = Harness::new(FakeFetcher::answering(catalog_payload()), FakeHost::default());
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        assert!(result.success);
        assert_eq!(harness.host.activations(), 0);
        assert!(!harness.host.is_active(BASENAME).unwrap());
    }

    #[tokio::test]
    async fn test_reactivation_failure_is_non_fatal() {
        let mut harness = Harness::new(
            FakeFetcher::answering(catalog_payload()),
            FakeHost::with_active(BASENAME).refusing_activation(),
        );
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        assert!(result.success);
        assert_eq!(result.error_code, Some(RollbackErrorCode::ReactivationFailure));
        let json = result.to_json();
        assert_eq!(json["error"], false);
        assert_eq!(json["errorCode"], "reactivation_failure");
    }

    #[tokio::test]
    async fn test_install_failure() {
        let mut harness = Harness::active();
        harness.seed_cache();
        harness.installer = FakeInstaller {
            fail_install: true,
            ..FakeInstaller::default()
        };
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        assert!(!result.success);
        assert_eq!(result.error_code, Some(RollbackErrorCode::InstallFailure));
        assert_eq!(harness.host.activations(), 0);
        assert!(harness.cached(), "failed rollbacks leave the cache alone");
    }

    #[tokio::test]
    async fn test_connect_failure_is_install_failure() {
        let mut harness = Harness::active();
        harness.installer.refuse_connect = true;
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        assert_eq!(result.error_code, Some(RollbackErrorCode::InstallFailure));
        assert_eq!(harness.installer.runs, 0);
    }

    #[tokio::test]
    async fn test_same_origin_enforcement() {
        let mut payload = catalog_payload();
        payload["versions"]["1.7.0"] = json!("https://mirror.evil.test/1.7.0.zip");

        let mut harness = Harness::new(FakeFetcher::answering(payload.clone()), FakeHost::default());
        harness.options.same_origin_packages = true;
        let request = harness.request("1.7.0");
        let result = harness.run(&request).await;
        assert_eq!(result.error_code, Some(RollbackErrorCode::NoTargetVersion));
        assert_eq!(harness.installer.runs, 0);

        let request = harness.request("1.8.0");
        assert!(harness.run(&request).await.success);

        // Off by default
        let mut harness = Harness::new(FakeFetcher::answering(payload), FakeHost::default());
        let request = harness.request("1.7.0");
        assert!(harness.run(&request).await.success);
    }

    #[tokio::test]
    async fn test_verbose_mode_attaches_trace() {
        let mut harness = Harness::active();
        harness.options.verbose = true;
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        let trace = result.debug_trace.clone().unwrap();
        assert_eq!(trace.first().map(String::as_str), Some("idle -> validate"));
        assert!(trace.contains(&"validate -> resolve_package".to_string()));
        assert!(trace.contains(&"1 run(s)".to_string()));
        assert_eq!(trace.last().map(String::as_str), Some("reactivate -> done"));
        assert_eq!(result.to_json()["debug"], json!(trace));
    }

    #[tokio::test]
    async fn test_inactive_plugin_trace_skips_reactivate() {
        let mut harness = Harness::new(FakeFetcher::answering(catalog_payload()), FakeHost::default());
        harness.options.verbose = true;
        let request = harness.request("1.8.0");
        let result = harness.run(&request).await;

        assert!(result.success, "{}", result.message);
        let trace = result.debug_trace.unwrap();
        assert!(trace.iter().all(|line| !line.contains("reactivate")), "{trace:?}");
        assert_eq!(trace.last().map(String::as_str), Some("install -> done"));
    }

    #[tokio::test]
    async fn test_verbose_trace_on_failure_ends_in_failed() {
        let mut harness = Harness::active();
        harness.options.verbose = true;
        let request = harness.request("1.9.0");
        let result = harness.run(&request).await;

        let trace = result.debug_trace.unwrap();
        assert_eq!(trace.last().map(String::as_str), Some("resolve_package -> failed"));
    }
}
