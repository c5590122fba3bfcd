#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use simtrack_core::{DeviceReport, DialPlan, PendingNumber};
    use simtrack_goip::GoipClient;
    use simtrack_provider::ProviderClient;
    use simtrack_storage::traits::{HistoryStore, RegistryStore};
    use simtrack_storage::StorageBackend;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::reconcile::{ReconcileService, RecordOutcome};
    use crate::retry::RetryPolicy;

    struct Harness {
        provider_server: MockServer,
        goip_server: MockServer,
        storage: Arc<StorageBackend>,
        service: Arc<ReconcileService>,
    }

    async fn harness() -> Harness {
        let provider_server = MockServer::start().await;
        let goip_server = MockServer::start().await;
        let storage = Arc::new(StorageBackend::new_memory());
        let provider =
            Arc::new(ProviderClient::new(provider_server.uri(), "test-key".to_owned()).unwrap());
        let goip = Arc::new(
            GoipClient::new(goip_server.uri(), "admin".to_owned(), "secret".to_owned()).unwrap(),
        );
        let service = Arc::new(ReconcileService::new(
            Arc::clone(&storage),
            provider,
            goip,
            DialPlan::default(),
            "col".to_owned(),
            RetryPolicy::new(3, Duration::ZERO),
        ));
        Harness { provider_server, goip_server, storage, service }
    }

    fn pending(phone: &str) -> PendingNumber {
        PendingNumber {
            item_id: format!("item-{phone}"),
            phone_number: phone.to_owned(),
            country_id: "col".to_owned(),
            fetched_at: None,
        }
    }

    fn device(sn: &str, port: &str, active: bool) -> DeviceReport {
        DeviceReport {
            port: port.to_owned(),
            iccid: "8957000000000000001".to_owned(),
            imei: "350000000000001".to_owned(),
            imsi: "732000000000001".to_owned(),
            sn: sn.to_owned(),
            st: Some("3".to_owned()),
            active,
            slot_active: Some("1".to_owned()),
        }
    }

    async fn mount_wait_list(server: &MockServer, phones: &[&str]) {
        let entries: Vec<serde_json::Value> = phones
            .iter()
            .map(|phone| {
                serde_json::json!({
                    "Item_ID": format!("item-{phone}"),
                    "Phone_Num": phone,
                    "Country_ID": "col"
                })
            })
            .collect();
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"act": "GetWaitPhoneList"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": entries})),
            )
            .mount(server)
            .await;
    }

    async fn mount_result(server: &MockServer, phone: &str, is_ret: bool) {
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "act": "GetResultPhoneList",
                "Phone_Num": phone
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "Phone_IsRet": is_ret,
                    "Phone_RetTime": "2025-01-01 10:05:00",
                    "Phone_Remark": "ok",
                    "Phone_RemarkTime": "2025-01-01 10:05:01"
                }]
            })))
            .mount(server)
            .await;
    }

    async fn mount_messages(server: &MockServer, port: &str, texts: &[&str]) {
        let rows: Vec<serde_json::Value> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                serde_json::json!([
                    i, port, "2025-01-01 10:02:11", "85522", "3001234567", BASE64.encode(text)
                ])
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/goip_get_sms.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": 0, "data": rows})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn ingest_soft_rejects_duplicates() {
        let h = harness().await;
        let report =
            h.service.ingest(&[pending("3001234567"), pending("3001234567")]).await;
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.failures, 0);

        let page = h.storage.list_history(0, 10).await.unwrap();
        assert_eq!(page.total, 1, "duplicate must not create a second record");
    }

    #[tokio::test]
    async fn full_cycle_relays_last_message_and_evaluates() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001234567", "1A", true)).await.unwrap();

        mount_wait_list(&h.provider_server, &["3001234567"]).await;
        mount_result(&h.provider_server, "3001234567", true).await;
        mount_messages(&h.goip_server, "1A", &["first message", "your code is 4217"]).await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "act": "UploadSms",
                "Phone_Num": "3001234567",
                "Sms_Content": "your code is 4217"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"code": 0}})),
            )
            .expect(1)
            .mount(&h.provider_server)
            .await;

        let report = h.service.run_cycle().await.unwrap();
        assert!(!report.skipped);
        assert_eq!(report.ingest.inserted, 1);
        assert_eq!(report.checked, 1);
        assert_eq!(report.delivered, 1);

        let record =
            h.storage.find_history_by_phone("3001234567").await.unwrap();
        assert!(record.is_none(), "evaluated record must leave the pending set");
        let page = h.storage.list_history(0, 10).await.unwrap();
        let record = &page.items[0];
        assert!(record.evaluated);
        assert!(record.is_returned);
        assert_eq!(record.last_message.as_deref(), Some("your code is 4217"));
        assert_eq!(record.last_delivery_code, Some(0));
    }

    #[tokio::test]
    async fn unconfirmed_delivery_retries_to_the_bound() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001234567", "1A", true)).await.unwrap();

        mount_wait_list(&h.provider_server, &["3001234567"]).await;
        mount_result(&h.provider_server, "3001234567", true).await;
        mount_messages(&h.goip_server, "1A", &["your code is 4217"]).await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"act": "UploadSms"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"code": 5}})),
            )
            .expect(3)
            .mount(&h.provider_server)
            .await;

        let report = h.service.run_cycle().await.unwrap();
        assert_eq!(report.unconfirmed, 1);
        assert_eq!(report.delivered, 0);

        let page = h.storage.list_history(0, 10).await.unwrap();
        let record = &page.items[0];
        assert!(record.evaluated, "exhausted retries still close the record");
        assert_eq!(record.last_delivery_code, Some(5));
    }

    #[tokio::test]
    async fn first_attempt_dispatch_reject_is_not_retried() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001234567", "1A", true)).await.unwrap();

        mount_wait_list(&h.provider_server, &["3001234567"]).await;
        mount_result(&h.provider_server, "3001234567", true).await;
        mount_messages(&h.goip_server, "1A", &["your code is 4217"]).await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"act": "UploadSms"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 102,
                "reason": "cannot dispatch"
            })))
            .expect(1)
            .mount(&h.provider_server)
            .await;

        let report = h.service.run_cycle().await.unwrap();
        assert_eq!(report.dispatch_failed, 1);

        let page = h.storage.list_history(0, 10).await.unwrap();
        let record = &page.items[0];
        assert!(record.evaluated, "dispatch failure closes the record on first attempt");
        assert_eq!(record.last_delivery_code, Some(102));
    }

    #[tokio::test]
    async fn not_returned_record_stays_pending() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001234567", "1A", true)).await.unwrap();

        mount_wait_list(&h.provider_server, &["3001234567"]).await;
        mount_result(&h.provider_server, "3001234567", false).await;

        let report = h.service.run_cycle().await.unwrap();
        assert_eq!(report.not_returned, 1);

        let record =
            h.storage.find_history_by_phone("3001234567").await.unwrap().unwrap();
        assert!(!record.evaluated);
        assert!(!record.is_returned);
    }

    #[tokio::test]
    async fn empty_port_leaves_record_for_next_cycle() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001234567", "1A", true)).await.unwrap();

        mount_wait_list(&h.provider_server, &["3001234567"]).await;
        mount_result(&h.provider_server, "3001234567", true).await;
        mount_messages(&h.goip_server, "1A", &[]).await;

        let report = h.service.run_cycle().await.unwrap();
        assert_eq!(report.no_messages, 1);

        let record =
            h.storage.find_history_by_phone("3001234567").await.unwrap().unwrap();
        assert!(!record.evaluated);
        assert!(record.is_returned, "the receipt persists even without messages");
    }

    #[tokio::test]
    async fn one_failing_record_does_not_abort_siblings() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001110001", "1A", true)).await.unwrap();
        h.storage.upsert_device(&device("573001110002", "1B", true)).await.unwrap();

        mount_wait_list(&h.provider_server, &["3001110001", "3001110002"]).await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "act": "GetResultPhoneList",
                "Phone_Num": "3001110001"
            })))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&h.provider_server)
            .await;
        mount_result(&h.provider_server, "3001110002", false).await;

        let report = h.service.run_cycle().await.unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.failures, 1);
        assert_eq!(report.not_returned, 1);
    }

    #[tokio::test]
    async fn inactive_and_unlinked_numbers_are_not_checked() {
        let h = harness().await;
        // Active device only for the first number; retired for the second;
        // none for the third.
        h.storage.upsert_device(&device("573001110001", "1A", true)).await.unwrap();
        h.storage.upsert_device(&device("573001110002", "1B", false)).await.unwrap();

        mount_wait_list(&h.provider_server, &["3001110001", "3001110002", "3001110003"]).await;
        mount_result(&h.provider_server, "3001110001", false).await;

        let report = h.service.run_cycle().await.unwrap();
        assert_eq!(report.ingest.inserted, 3);
        assert_eq!(report.checked, 1, "only the linked active number is checked");
    }

    #[tokio::test]
    async fn concurrent_cycle_is_skipped() {
        let h = harness().await;

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"act": "GetWaitPhoneList"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": []}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&h.provider_server)
            .await;

        let service = Arc::clone(&h.service);
        let first = tokio::spawn(async move { service.run_cycle().await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = h.service.run_cycle().await.unwrap();
        assert!(second.skipped);

        let first = first.await.unwrap().unwrap();
        assert!(!first.skipped);
    }

    #[tokio::test]
    async fn cleanup_deletes_retired_numbers_and_stops_on_short_page() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001110001", "1A", true)).await.unwrap();
        h.storage.upsert_device(&device("573001110002", "1B", false)).await.unwrap();
        h.storage.upsert_device(&device("573001110003", "1C", false)).await.unwrap();

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"act": "PhoneDeleteBatch"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": "ok"})),
            )
            .expect(1)
            .mount(&h.provider_server)
            .await;

        let report = h.service.cleanup_retired().await.unwrap();
        assert_eq!(report.pages_scanned, 1, "a short page ends the scan");
        assert_eq!(report.deleted, 2);
        assert_eq!(report.page_errors, 0);
    }

    #[tokio::test]
    async fn cleanup_counts_page_errors_without_halting() {
        let h = harness().await;
        h.storage.upsert_device(&device("573001110001", "1A", false)).await.unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&h.provider_server)
            .await;

        let report = h.service.cleanup_retired().await.unwrap();
        assert_eq!(report.page_errors, 1);
        assert_eq!(report.deleted, 0);
    }

    #[tokio::test]
    async fn evaluate_record_folds_errors_into_outcome() {
        let h = harness().await;
        let record = simtrack_core::HistoryRecord::from_pending(
            "r1".to_owned(),
            &pending("3001234567"),
        );
        h.storage.insert_history(&record).await.unwrap();

        // No provider mock mounted: the check fails, the outcome carries it.
        let outcome = h.service.evaluate_record(&record).await;
        assert!(matches!(outcome, RecordOutcome::Failed(_)), "got {outcome:?}");
    }
}
