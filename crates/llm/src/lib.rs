use std::sync::Arc;

mod echo;
mod provider;
mod rig_adapter;

pub use echo::{DEFAULT_WORD_DELAY, ECHO_PROVIDER_ID, EchoProvider};
pub use provider::{
    ChatProvider, ProviderConfig, ProviderError, ProviderEventStream, ProviderMessage,
    ProviderResult, ProviderStreamHandle, ProviderWorker, SnapshotAccumulator, StreamEvent,
    StreamPayload, StreamRequest,
};
pub use rig_adapter::{RIG_OPENAI_PROVIDER_ID, RigProvider};

pub fn create_provider(mut config: ProviderConfig) -> ProviderResult<Arc<dyn ChatProvider>> {
    if config.provider_id.trim().is_empty() {
        config.provider_id = RIG_OPENAI_PROVIDER_ID.to_string();
    }

    match config.provider_id.as_str() {
        "openai" | "rig-openai" => {
            config.provider_id = RIG_OPENAI_PROVIDER_ID.to_string();
            Ok(Arc::new(RigProvider::new(config)?))
        }
        ECHO_PROVIDER_ID => Ok(Arc::new(EchoProvider::default())),
        _ => Err(ProviderError::UnsupportedProvider {
            stage: "create-provider",
            provider_id: config.provider_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_provider_id_defaults_to_openai() {
        let provider = create_provider(ProviderConfig::new(" ", "sk-test", "")).unwrap();
        assert_eq!(provider.id(), RIG_OPENAI_PROVIDER_ID);
    }

    #[test]
    fn rig_alias_is_normalized() {
        let provider = create_provider(ProviderConfig::new("rig-openai", "sk-test", "")).unwrap();
        assert_eq!(provider.id(), RIG_OPENAI_PROVIDER_ID);
    }

    #[test]
    fn echo_needs_no_key() {
        let provider = create_provider(ProviderConfig::new("echo", "", "")).unwrap();
        assert_eq!(provider.name(), "Echo");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let error = create_provider(ProviderConfig::new("acme", "key", "")).err().unwrap();
        assert!(matches!(error, ProviderError::UnsupportedProvider { .. }));
    }

    #[test]
    fn openai_without_key_is_rejected() {
        let error = create_provider(ProviderConfig::new("openai", "", "")).err().unwrap();
        assert!(matches!(error, ProviderError::MissingApiKey { .. }));
    }
}
