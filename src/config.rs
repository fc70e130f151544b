use std::env;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::config::Credentials;

use crate::error::{ChatError, Result};

pub const DEFAULT_CHATS_TABLE_NAME: &str = "Chats";

const CREDENTIALS_PROVIDER_NAME: &str = "ChatStoreEnvironment";

/// Static AWS settings resolved once at process start.
#[derive(Clone)]
pub struct AwsSettings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub chats_table: String,
}

impl std::fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSettings")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("chats_table", &self.chats_table)
            .finish()
    }
}

impl AwsSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_REGION` must be
    /// present and non-blank; everything else is optional.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ChatError::Config(format!("{key} is not set")))
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            session_token: optional("AWS_SESSION_TOKEN"),
            region: required("AWS_REGION")?,
            endpoint_url: optional("AWS_ENDPOINT_URL"),
            chats_table: optional("CHATS_TABLE_NAME")
                .unwrap_or_else(|| DEFAULT_CHATS_TABLE_NAME.to_string()),
        })
    }

    /// Build the SDK configuration with static credentials and the target region.
    ///
    /// Nothing is sent over the network here; the SDK connects lazily.
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let credentials = Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            self.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        loader.load().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_required_and_defaults() {
        let settings = AwsSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_REGION", "eu-west-1"),
        ]))
        .unwrap();

        assert_eq!(settings.access_key_id, "AKIDEXAMPLE");
        assert_eq!(settings.secret_access_key, "secret");
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.session_token, None);
        assert_eq!(settings.endpoint_url, None);
        assert_eq!(settings.chats_table, DEFAULT_CHATS_TABLE_NAME);
    }

    #[test]
    fn test_from_lookup_reads_optional_overrides() {
        let settings = AwsSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_REGION", "us-east-1"),
            ("AWS_SESSION_TOKEN", "token"),
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
            ("CHATS_TABLE_NAME", "ChatsTest"),
        ]))
        .unwrap();

        assert_eq!(settings.session_token.as_deref(), Some("token"));
        assert_eq!(settings.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(settings.chats_table, "ChatsTest");
    }

    #[test]
    fn test_from_lookup_rejects_missing_region() {
        let err = AwsSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]))
        .unwrap_err();

        match err {
            ChatError::Config(msg) => assert!(msg.contains("AWS_REGION")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_lookup_rejects_blank_secret() {
        let err = AwsSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "  "),
            ("AWS_REGION", "us-east-1"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ChatError::Config(msg) if msg.contains("AWS_SECRET_ACCESS_KEY")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = AwsSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "super-secret"),
            ("AWS_REGION", "us-east-1"),
        ]))
        .unwrap();

        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("AKIDEXAMPLE"));
    }

    #[tokio::test]
    async fn test_load_sdk_config_uses_region() {
        let settings = AwsSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_REGION", "ap-southeast-2"),
        ]))
        .unwrap();

        let config = settings.load_sdk_config().await;
        assert_eq!(
            config.region().map(ToString::to_string).as_deref(),
            Some("ap-southeast-2")
        );
    }
}
