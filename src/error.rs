use std::path::PathBuf;
use thiserror::Error; // use thiserror::Error; を追加

#[derive(Debug, Error)] // thiserror::Error を使用
pub enum AppError {
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSONパースエラー ファイル: {file_path:?}, 詳細: {source}")]
    JsonParse {
        file_path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("入力検証エラー: {0}")]
    InputValidation(String),

    #[error("Merkleルート形式エラー ({value}): {reason}")]
    MerkleRootFormat { value: String, reason: String },

    #[error("償還可能総額の計算でオーバーフロー: 累計 {accumulated} sats + {satoshis} sats (UTXOインデックス {index})")]
    AmountOverflow {
        accumulated: u64,
        satoshis: u64,
        index: usize,
    },

    #[error("ネットワーク \"{name}\" は設定テーブルに存在しません")]
    UnknownNetwork { name: String },

    #[error("secrets.json にネットワーク \"{network}\" の設定が見つかりません")]
    MissingNetworkSecrets { network: String },

    #[error("secrets.json のネットワーク \"{network}\" に \"{field}\" がありません")]
    MissingSecretsField {
        network: String,
        field: &'static str,
    },

    #[error("ネットワークID不整合: 設定値 {expected} vs ノード応答 {actual}")]
    NetworkIdMismatch { expected: String, actual: String },

    #[error("接続先にアカウントが存在しません (eth_accounts が空)")]
    NoAccounts,

    #[error("RPC送信エラー ({url}): {source}")]
    RpcTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("RPCエラー応答 (method={method}, code={code}): {message}")]
    RpcResponse {
        method: String,
        code: i64,
        message: String,
    },

    #[error("デプロイ失敗: {0}")]
    DeploymentFailed(String),

    #[error("レシート待機がタイムアウトしました (tx={tx_hash}, 上限 {timeout_ms} ms)")]
    ReceiptTimeout { tx_hash: String, timeout_ms: u64 },

    #[error("内部エラー: {0}")]
    Internal(String),
}
