use std::path::Path;

use crate::config::{self, SecretsFile};
use crate::error::AppError;
use crate::types::NetworkId;

/// デプロイ先ネットワークの静的定義テーブル。
/// プロセス起動時から不変で、実行時に書き換えられることはない。
pub const NETWORKS: &[NetworkEntry] = &[
    NetworkEntry {
        name: "dev",
        network_id: NetworkId::Any,
        kind: EndpointKind::Node {
            host: "localhost",
            port: 8545,
        },
    },
    NetworkEntry {
        name: "kovan",
        network_id: NetworkId::Id(42),
        kind: EndpointKind::WalletProvider,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct NetworkEntry {
    pub name: &'static str,
    pub network_id: NetworkId,
    pub kind: EndpointKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// ホスト/ポート直結のノード (開発用)
    Node { host: &'static str, port: u16 },
    /// secrets.json の資格情報から遅延構築するウォレットプロバイダ
    WalletProvider,
}

/// ネットワーク名からテーブルエントリを引く。
/// 未定義の名前はその名前入りのエラーで即終了 (接続は一切試みない)。
pub fn find_network(name: &str) -> Result<&'static NetworkEntry, AppError> {
    NETWORKS
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| AppError::UnknownNetwork {
            name: name.to_string(),
        })
}

/// 解決済みの接続情報。デプロイヤはこれだけを受け取る。
#[derive(Debug, Clone)]
pub enum Connection {
    /// ノード直結 (dev系)
    Node { url: String, network_id: NetworkId },
    /// 資格情報付きウォレットプロバイダ (kovan系)。
    /// 秘密鍵は外部の署名レイヤへ引き渡すために保持する。
    Wallet {
        url: String,
        private_keys: Vec<String>,
        network_id: NetworkId,
    },
}

impl Connection {
    pub fn rpc_url(&self) -> &str {
        match self {
            Connection::Node { url, .. } => url,
            Connection::Wallet { url, .. } => url,
        }
    }

    pub fn network_id(&self) -> NetworkId {
        match self {
            Connection::Node { network_id, .. } => *network_id,
            Connection::Wallet { network_id, .. } => *network_id,
        }
    }

    /// 署名レイヤへ引き渡す秘密鍵 (Wallet型のみ)
    pub fn signing_keys(&self) -> Option<&[String]> {
        match self {
            Connection::Wallet { private_keys, .. } => Some(private_keys),
            Connection::Node { .. } => None,
        }
    }
}

/// ネットワークエントリを接続情報へ解決する。
/// secrets.json を読むのは WalletProvider 型のネットワークが要求されたときだけで、
/// 使わないネットワークの資格情報を要求しない。
pub fn resolve_connection(entry: &NetworkEntry, secrets_path: &Path) -> Result<Connection, AppError> {
    match entry.kind {
        EndpointKind::Node { host, port } => {
            let url = format!("http://{}:{}", host, port);
            log::debug!(
                "ネットワーク \"{}\" を静的設定から解決しました: {}",
                entry.name,
                url
            );
            Ok(Connection::Node {
                url,
                network_id: entry.network_id,
            })
        }
        EndpointKind::WalletProvider => {
            log::info!(
                "ネットワーク \"{}\" の資格情報を {:?} から解決します。",
                entry.name,
                secrets_path
            );
            let secrets: SecretsFile = config::read_json_file(secrets_path)?;
            let record = secrets
                .get(entry.name)
                .ok_or_else(|| AppError::MissingNetworkSecrets {
                    network: entry.name.to_string(),
                })?;

            let private_keys = match &record.private_keys {
                Some(keys) if !keys.is_empty() => keys.clone(),
                _ => {
                    return Err(AppError::MissingSecretsField {
                        network: entry.name.to_string(),
                        field: "privateKeys",
                    });
                }
            };
            let url = match &record.url {
                Some(url) if !url.is_empty() => url.clone(),
                _ => {
                    return Err(AppError::MissingSecretsField {
                        network: entry.name.to_string(),
                        field: "url",
                    });
                }
            };

            log::debug!(
                "ネットワーク \"{}\" の資格情報を解決しました: url={}",
                entry.name,
                url
            );
            Ok(Connection::Wallet {
                url,
                private_keys,
                network_id: entry.network_id,
            })
        }
    }
}

/// レシート待機やガスレポートなどのデプロイ実行オプション
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// レシート待機とHTTPリクエストの上限 (ミリ秒)
    pub timeout_ms: u64,
    pub reporter: Reporter,
    /// ガスレポートの通貨ラベル
    pub currency: &'static str,
    /// ガスレポートの想定ガス価格 (gwei)
    pub gas_price_gwei: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reporter {
    /// 通常の完了ログのみ
    Spec,
    /// デプロイ後にガスレポートを出力
    Gas,
}

impl Reporter {
    /// GAS_REPORTER が非空で設定されていれば Gas
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Reporter::Gas,
            _ => Reporter::Spec,
        }
    }
}

const DEPLOY_TIMEOUT_MS: u64 = 600_000;

impl RunnerOptions {
    pub fn from_env() -> Self {
        let gas_reporter = std::env::var("GAS_REPORTER").ok();
        RunnerOptions {
            timeout_ms: DEPLOY_TIMEOUT_MS,
            reporter: Reporter::from_env_value(gas_reporter.as_deref()),
            currency: "USD",
            gas_price_gwei: 21,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_secrets(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn unknown_network_fails_naming_it() {
        let err = find_network("ropsten").unwrap_err();
        match err {
            AppError::UnknownNetwork { name } => assert_eq!(name, "ropsten"),
            other => panic!("想定外のエラー: {:?}", other),
        }
    }

    #[test]
    fn dev_resolves_without_touching_secrets() {
        let entry = find_network("dev").unwrap();
        // secrets.json が存在しなくても静的ネットワークは解決できる
        let connection =
            resolve_connection(entry, Path::new("/no/such/secrets.json")).unwrap();
        assert_eq!(connection.rpc_url(), "http://localhost:8545");
        assert_eq!(connection.network_id(), NetworkId::Any);
        assert!(connection.signing_keys().is_none());
    }

    #[test]
    fn wallet_network_resolves_from_secrets() {
        let entry = find_network("kovan").unwrap();
        let file = write_secrets(
            r#"{"kovan": {"privateKeys": ["aa", "bb"], "url": "https://kovan.example"}}"#,
        );
        let connection = resolve_connection(entry, file.path()).unwrap();
        assert_eq!(connection.rpc_url(), "https://kovan.example");
        assert_eq!(connection.network_id(), NetworkId::Id(42));
        assert_eq!(connection.signing_keys().unwrap().len(), 2);
    }

    #[test]
    fn wallet_network_fails_when_record_is_missing() {
        let entry = find_network("kovan").unwrap();
        let file = write_secrets(r#"{"dev": {"privateKeys": ["aa"], "url": "http://x"}}"#);
        let err = resolve_connection(entry, file.path()).unwrap_err();
        match err {
            AppError::MissingNetworkSecrets { network } => assert_eq!(network, "kovan"),
            other => panic!("想定外のエラー: {:?}", other),
        }
    }

    #[test]
    fn wallet_network_fails_on_missing_private_keys() {
        let entry = find_network("kovan").unwrap();
        let file = write_secrets(r#"{"kovan": {"url": "https://kovan.example"}}"#);
        let err = resolve_connection(entry, file.path()).unwrap_err();
        match err {
            AppError::MissingSecretsField { network, field } => {
                assert_eq!(network, "kovan");
                assert_eq!(field, "privateKeys");
            }
            other => panic!("想定外のエラー: {:?}", other),
        }
    }

    #[test]
    fn wallet_network_fails_on_empty_private_keys() {
        let entry = find_network("kovan").unwrap();
        let file =
            write_secrets(r#"{"kovan": {"privateKeys": [], "url": "https://kovan.example"}}"#);
        let err = resolve_connection(entry, file.path()).unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingSecretsField { field: "privateKeys", .. }
        ));
    }

    #[test]
    fn wallet_network_fails_on_missing_url() {
        let entry = find_network("kovan").unwrap();
        let file = write_secrets(r#"{"kovan": {"privateKeys": ["aa"]}}"#);
        let err = resolve_connection(entry, file.path()).unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingSecretsField { field: "url", .. }
        ));
    }

    #[test]
    fn wallet_network_fails_on_empty_url() {
        let entry = find_network("kovan").unwrap();
        let file = write_secrets(r#"{"kovan": {"privateKeys": ["aa"], "url": ""}}"#);
        let err = resolve_connection(entry, file.path()).unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingSecretsField { field: "url", .. }
        ));
    }

    #[test]
    fn reporter_follows_gas_reporter_env_value() {
        assert_eq!(Reporter::from_env_value(None), Reporter::Spec);
        assert_eq!(Reporter::from_env_value(Some("")), Reporter::Spec);
        assert_eq!(Reporter::from_env_value(Some("1")), Reporter::Gas);
        assert_eq!(Reporter::from_env_value(Some("true")), Reporter::Gas);
    }
}
