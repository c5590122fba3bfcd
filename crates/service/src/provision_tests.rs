#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use simtrack_core::DeviceReport;
    use simtrack_provider::ProviderClient;
    use simtrack_storage::traits::RegistryStore;
    use simtrack_storage::StorageBackend;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::provision::ProvisionService;

    fn report(sn: &str) -> DeviceReport {
        DeviceReport {
            port: "1A".to_owned(),
            iccid: "8957000000000000001".to_owned(),
            imei: "350000000000001".to_owned(),
            imsi: "732000000000001".to_owned(),
            sn: sn.to_owned(),
            st: Some("3".to_owned()),
            active: true,
            slot_active: Some("1".to_owned()),
        }
    }

    async fn service_for(server: &MockServer) -> (ProvisionService, Arc<StorageBackend>) {
        let storage = Arc::new(StorageBackend::new_memory());
        let provider =
            Arc::new(ProviderClient::new(server.uri(), "test-key".to_owned()).unwrap());
        (ProvisionService::new(Arc::clone(&storage), provider, "col".to_owned()), storage)
    }

    async fn mount_add_batch(server: &MockServer, batch_id: &str) {
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"act": "PhoneAddBatch"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": batch_id})),
            )
            .mount(server)
            .await;
    }

    async fn mount_batch_status(server: &MockServer, status: &str) {
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"act": "PhoneBatchResult"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"Phone_Status": status}]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn provisions_device_and_stamps_batch() {
        let server = MockServer::start().await;
        let (service, storage) = service_for(&server).await;
        mount_add_batch(&server, "B-7781").await;
        mount_batch_status(&server, "2").await;

        let result = service.provision(vec![report("573001234567")]).await;
        assert_eq!(result.processed, 1);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.entries[0].batch_id.as_deref(), Some("B-7781"));

        let device =
            storage.find_device_by_sn("573001234567").await.unwrap().unwrap();
        assert_eq!(device.batch_id.as_deref(), Some("B-7781"));
        assert_eq!(device.status, "2");
    }

    #[tokio::test]
    async fn existing_batch_assignment_is_kept() {
        let server = MockServer::start().await;
        let (service, storage) = service_for(&server).await;
        mount_add_batch(&server, "B-1").await;
        mount_batch_status(&server, "2").await;
        service.provision(vec![report("573001234567")]).await;

        // Re-provisioning the same sn must not move it to the new batch.
        server.reset().await;
        mount_add_batch(&server, "B-2").await;
        mount_batch_status(&server, "9").await;
        let result = service.provision(vec![report("573001234567")]).await;
        assert_eq!(result.succeeded, 1);

        let device =
            storage.find_device_by_sn("573001234567").await.unwrap().unwrap();
        assert_eq!(device.batch_id.as_deref(), Some("B-1"));
    }

    #[tokio::test]
    async fn unstamped_row_is_repaired_by_the_next_report() {
        let server = MockServer::start().await;
        let (service, storage) = service_for(&server).await;

        // No mocks: the batch submission fails after the registry upsert,
        // leaving a registered row with no batch.
        let result = service.provision(vec![report("573001234567")]).await;
        assert_eq!(result.succeeded, 0);
        let device =
            storage.find_device_by_sn("573001234567").await.unwrap().unwrap();
        assert!(device.batch_id.is_none());

        mount_add_batch(&server, "B-9").await;
        mount_batch_status(&server, "2").await;
        let result = service.provision(vec![report("573001234567")]).await;
        assert_eq!(result.succeeded, 1);
        let device =
            storage.find_device_by_sn("573001234567").await.unwrap().unwrap();
        assert_eq!(device.batch_id.as_deref(), Some("B-9"));
    }

    #[tokio::test]
    async fn batch_status_failure_downgrades_to_default() {
        let server = MockServer::start().await;
        let (service, storage) = service_for(&server).await;
        mount_add_batch(&server, "B-1").await;
        // No PhoneBatchResult mock: the status query 404s.

        let result = service.provision(vec![report("573001234567")]).await;
        assert_eq!(result.succeeded, 1);

        let device =
            storage.find_device_by_sn("573001234567").await.unwrap().unwrap();
        assert_eq!(device.status, "1");
    }

    #[tokio::test]
    async fn one_bad_report_fails_independently() {
        let server = MockServer::start().await;
        let (service, storage) = service_for(&server).await;
        mount_add_batch(&server, "B-1").await;
        mount_batch_status(&server, "1").await;

        let result =
            service.provision(vec![report(""), report("573001234567")]).await;
        assert_eq!(result.processed, 2);
        assert_eq!(result.succeeded, 1);

        let failed = result.entries.iter().find(|e| !e.success).unwrap();
        assert!(failed.error.is_some());
        assert!(storage.find_device_by_sn("573001234567").await.unwrap().is_some());
    }
}
