//! Kubeconfig YAML in the layout `kubectl` reads and writes, and the secret
//! payload that carries it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::kube::{AuthInfo, Cluster, Config, Context};
use crate::error::{Error, Result};
use crate::secret::{Secret, KUBECONFIG_DATA_NAME};
use crate::utils::serde_b64;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct KubeConfigFile {
    #[serde(rename = "apiVersion", default)]
    api_version: String,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    current_context: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    preferences: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    users: Vec<NamedAuthInfo>,
}

#[derive(Serialize, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterFields,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ClusterFields {
    #[serde(
        default,
        with = "serde_b64::bytes",
        skip_serializing_if = "Vec::is_empty"
    )]
    certificate_authority_data: Vec<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    proxy_url: String,
    #[serde(default)]
    server: String,
}

#[derive(Serialize, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextFields,
}

#[derive(Serialize, Deserialize)]
struct ContextFields {
    #[serde(default)]
    cluster: String,
    #[serde(default)]
    user: String,
}

#[derive(Serialize, Deserialize)]
struct NamedAuthInfo {
    name: String,
    #[serde(default)]
    user: AuthInfoFields,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AuthInfoFields {
    #[serde(
        default,
        with = "serde_b64::bytes",
        skip_serializing_if = "Vec::is_empty"
    )]
    client_certificate_data: Vec<u8>,
    #[serde(
        default,
        with = "serde_b64::bytes",
        skip_serializing_if = "Vec::is_empty"
    )]
    client_key_data: Vec<u8>,
}

impl From<&Config> for KubeConfigFile {
    fn from(config: &Config) -> Self {
        KubeConfigFile {
            api_version: "v1".to_string(),
            clusters: config
                .clusters
                .iter()
                .map(|(name, cluster)| NamedCluster {
                    name: name.clone(),
                    cluster: ClusterFields {
                        certificate_authority_data: cluster.certificate_authority_data.clone(),
                        proxy_url: cluster.proxy_url.clone(),
                        server: cluster.server.clone(),
                    },
                })
                .collect(),
            contexts: config
                .contexts
                .iter()
                .map(|(name, context)| NamedContext {
                    name: name.clone(),
                    context: ContextFields {
                        cluster: context.cluster.clone(),
                        user: context.auth_info.clone(),
                    },
                })
                .collect(),
            current_context: config.current_context.clone(),
            kind: "Config".to_string(),
            preferences: BTreeMap::new(),
            users: config
                .auth_infos
                .iter()
                .map(|(name, auth_info)| NamedAuthInfo {
                    name: name.clone(),
                    user: AuthInfoFields {
                        client_certificate_data: auth_info.client_certificate_data.clone(),
                        client_key_data: auth_info.client_key_data.clone(),
                    },
                })
                .collect(),
        }
    }
}

fn insert_unique<T>(
    entries: &mut BTreeMap<String, T>,
    kind: &str,
    name: String,
    value: T,
) -> Result<()> {
    if entries.contains_key(&name) {
        return Err(Error::Deserialization {
            reason: format!("duplicate {} entry {:?}", kind, name),
            source: None,
        });
    }
    entries.insert(name, value);
    Ok(())
}

impl TryFrom<KubeConfigFile> for Config {
    type Error = Error;

    fn try_from(file: KubeConfigFile) -> Result<Self> {
        let mut config = Config {
            current_context: file.current_context,
            ..Default::default()
        };

        for named in file.clusters {
            let cluster = Cluster {
                server: named.cluster.server,
                certificate_authority_data: named.cluster.certificate_authority_data,
                proxy_url: named.cluster.proxy_url,
            };
            insert_unique(&mut config.clusters, "cluster", named.name, cluster)?;
        }
        for named in file.contexts {
            let context = Context {
                cluster: named.context.cluster,
                auth_info: named.context.user,
            };
            insert_unique(&mut config.contexts, "context", named.name, context)?;
        }
        for named in file.users {
            let auth_info = AuthInfo {
                client_certificate_data: named.user.client_certificate_data,
                client_key_data: named.user.client_key_data,
            };
            insert_unique(&mut config.auth_infos, "user", named.name, auth_info)?;
        }

        Ok(config)
    }
}

/// Serializes a kubeconfig to YAML.
pub fn write(config: &Config) -> Result<Vec<u8>> {
    let yaml = serde_yaml::to_string(&KubeConfigFile::from(config)).map_err(Error::Serialization)?;
    Ok(yaml.into_bytes())
}

/// Parses kubeconfig YAML (or JSON, which is a subset).
pub fn load(data: &[u8]) -> Result<Config> {
    let file: KubeConfigFile = serde_yaml::from_slice(data)
        .map_err(|e| Error::deserialization("failed to parse kubeconfig", e))?;
    Config::try_from(file)
}

/// The serialized kubeconfig stored in a secret.
pub fn kubeconfig_bytes(secret: &Secret) -> Result<&[u8]> {
    secret
        .data
        .get(KUBECONFIG_DATA_NAME)
        .map(Vec::as_slice)
        .ok_or(Error::PayloadFieldMissing {
            key: KUBECONFIG_DATA_NAME,
        })
}

pub fn from_secret(secret: &Secret) -> Result<Config> {
    load(kubeconfig_bytes(secret)?)
}

/// The cluster entry named after the cluster itself.
pub fn cluster_entry<'a>(config: &'a Config, cluster_name: &str) -> Result<&'a Cluster> {
    config
        .clusters
        .get(cluster_name)
        .ok_or_else(|| Error::ClusterNotInKubeconfig(cluster_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::ObjectKey;
    use pretty_assertions::assert_eq;

    const CA_PEM: &[u8] = b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    fn sample(proxy_url: &str) -> Config {
        Config {
            clusters: BTreeMap::from([(
                "demo".to_string(),
                Cluster {
                    server: "https://10.0.0.1:6443".to_string(),
                    certificate_authority_data: CA_PEM.to_vec(),
                    proxy_url: proxy_url.to_string(),
                },
            )]),
            contexts: BTreeMap::from([(
                "demo-admin@demo".to_string(),
                Context {
                    cluster: "demo".to_string(),
                    auth_info: "demo-admin".to_string(),
                },
            )]),
            auth_infos: BTreeMap::from([(
                "demo-admin".to_string(),
                AuthInfo {
                    client_certificate_data: b"cert".to_vec(),
                    client_key_data: b"key".to_vec(),
                },
            )]),
            current_context: "demo-admin@demo".to_string(),
        }
    }

    #[test]
    fn test_write_then_load_preserves_entries() {
        for proxy in ["", "http://proxy:8080"] {
            let config = sample(proxy);
            let loaded = load(&write(&config).unwrap()).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_yaml_layout_matches_kubectl() {
        let yaml = String::from_utf8(write(&sample("")).unwrap()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(value["apiVersion"], "v1");
        assert_eq!(value["kind"], "Config");
        assert_eq!(value["current-context"], "demo-admin@demo");
        assert_eq!(value["clusters"][0]["name"], "demo");
        assert_eq!(value["clusters"][0]["cluster"]["server"], "https://10.0.0.1:6443");
        assert_eq!(
            value["clusters"][0]["cluster"]["certificate-authority-data"],
            "LS0tLS1CRUdJTiBDRVJUSUZJQ0FURS0tLS0tCk1JSUIKLS0tLS1FTkQgQ0VSVElGSUNBVEUtLS0tLQo="
        );
        assert!(value["clusters"][0]["cluster"].get("proxy-url").is_none());
        assert_eq!(value["contexts"][0]["context"]["user"], "demo-admin");
        assert_eq!(value["users"][0]["user"]["client-certificate-data"], "Y2VydA==");
        assert_eq!(value["users"][0]["user"]["client-key-data"], "a2V5");

        let with_proxy: serde_yaml::Value =
            serde_yaml::from_slice(&write(&sample("http://proxy:8080")).unwrap()).unwrap();
        assert_eq!(
            with_proxy["clusters"][0]["cluster"]["proxy-url"],
            "http://proxy:8080"
        );
    }

    #[test]
    fn test_load_accepts_foreign_fields() {
        let yaml = r#"
apiVersion: v1
kind: Config
clusters:
- name: demo
  cluster:
    server: https://10.0.0.1:6443
    insecure-skip-tls-verify: true
contexts:
- name: ctx
  context:
    cluster: demo
    user: someone
    namespace: kube-system
current-context: ctx
users:
- name: someone
  user:
    token: abc
"#;
        let config = load(yaml.as_bytes()).unwrap();
        assert_eq!(config.clusters["demo"].server, "https://10.0.0.1:6443");
        assert!(config.auth_infos["someone"].client_certificate_data.is_empty());
    }

    #[test]
    fn test_load_context_without_cluster() {
        let yaml = "contexts:\n- name: ctx\n  context:\n    user: someone\ncurrent-context: ctx\n";
        let config = load(yaml.as_bytes()).unwrap();
        assert_eq!(config.contexts["ctx"].cluster, "");
        assert_eq!(config.contexts["ctx"].auth_info, "someone");
    }

    #[test]
    fn test_load_rejects_malformed_payloads() {
        let err = load(b"clusters: [oops").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));

        let bad_base64 = "users:\n- name: a\n  user:\n    client-certificate-data: '***'\n";
        let err = load(bad_base64.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));

        let duplicate = concat!(
            "clusters:\n",
            "- name: a\n  cluster: {server: x}\n",
            "- name: a\n  cluster: {server: y}\n",
        );
        let err = load(duplicate.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn test_secret_payload_helpers() {
        let key = ObjectKey::new("default", "demo-kubeconfig");
        let err = from_secret(&Secret::new(&key)).unwrap_err();
        assert!(matches!(err, Error::PayloadFieldMissing { key: "value" }));

        let config = sample("http://proxy:8080");
        let secret = Secret::new(&key).with_data(KUBECONFIG_DATA_NAME, write(&config).unwrap());
        let loaded = from_secret(&secret).unwrap();
        let cluster = cluster_entry(&loaded, "demo").unwrap();
        assert_eq!(cluster.proxy_url, "http://proxy:8080");

        let err = cluster_entry(&loaded, "other").unwrap_err();
        assert!(matches!(err, Error::ClusterNotInKubeconfig(_)));
    }
}
