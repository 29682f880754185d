//! Test utilities shared by the unit tests in this crate.

#[cfg(test)]
pub(crate) mod test_helpers {
    use crate::service::MappedEditsService;
    use std::time::Duration;

    /// Waits until the extension host's registrations have reached the
    /// service.
    ///
    /// Registrations travel over the connection like any other message, so
    /// a freshly started session may briefly report fewer providers.
    pub async fn wait_for_providers(service: &MappedEditsService, count: usize) {
        for _ in 0..200 {
            if service.provider_count() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} providers, found {}",
            count,
            service.provider_count()
        );
    }
}
