use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::ContractArtifact;
use crate::deploy::Deployer;
use crate::error::AppError;
use crate::network::{Connection, RunnerOptions};
use crate::types::{ConstructorArg, DeployedInstance, EthAddress};

/// レシート確認のポーリング間隔
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: Vec<Value>, id: u64) -> Self {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// ノード応答。エラー応答には result が無いので untagged で振り分けられる。
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse {
    Success { result: Value },
    Error { error: JsonRpcErrorObject },
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// 同期HTTP JSON-RPCクライアント
pub struct RpcClient {
    http: reqwest::blocking::Client,
    url: String,
    next_id: Cell<u64>,
}

impl RpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::RpcTransport {
                url: url.to_string(),
                source: e,
            })?;
        Ok(RpcClient {
            http,
            url: url.to_string(),
            next_id: Cell::new(1),
        })
    }

    pub fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, AppError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let request = JsonRpcRequest::new(method, params, id);
        log::debug!("RPC呼び出し: method={}, id={}", method, id);

        let response: JsonRpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<JsonRpcResponse>())
            .map_err(|e| AppError::RpcTransport {
                url: self.url.clone(),
                source: e,
            })?;

        match response {
            JsonRpcResponse::Success { result } => Ok(result),
            JsonRpcResponse::Error { error } => {
                log::error!(
                    "RPCがエラーを返しました: method={}, code={}, message={}",
                    method,
                    error.code,
                    error.message
                );
                Err(AppError::RpcResponse {
                    method: method.to_string(),
                    code: error.code,
                    message: error.message,
                })
            }
        }
    }
}

/// 解決済み接続に対するJSON-RPCベースのDeployer実装。
/// Wallet型接続の署名処理自体は外部プロバイダの責務で、ここでは接続先URLだけを使う。
pub struct RpcDeployer {
    client: RpcClient,
    timeout_ms: u64,
}

impl RpcDeployer {
    /// 接続を確立し、ノードのネットワークIDを設定値と照合する ('*'は任意に一致)。
    pub fn connect(connection: &Connection, options: &RunnerOptions) -> Result<Self, AppError> {
        if let Some(keys) = connection.signing_keys() {
            log::debug!("署名レイヤへ引き渡す秘密鍵: {} 本", keys.len());
        }

        let client = RpcClient::new(
            connection.rpc_url(),
            Duration::from_millis(options.timeout_ms),
        )?;
        let deployer = RpcDeployer {
            client,
            timeout_ms: options.timeout_ms,
        };

        let reported = deployer.net_version()?;
        let expected = connection.network_id();
        if !expected.matches(&reported) {
            return Err(AppError::NetworkIdMismatch {
                expected: expected.to_string(),
                actual: reported,
            });
        }
        log::info!(
            "ノードに接続しました: url={}, network_id={}",
            connection.rpc_url(),
            reported
        );
        Ok(deployer)
    }

    fn net_version(&self) -> Result<String, AppError> {
        let result = self.client.call("net_version", vec![])?;
        result
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Internal(format!("net_versionの応答が文字列ではありません: {}", result)))
    }

    fn wait_for_receipt(&self, tx_hash: &str) -> Result<Value, AppError> {
        let deadline = Instant::now() + Duration::from_millis(self.timeout_ms);
        loop {
            let receipt = self
                .client
                .call("eth_getTransactionReceipt", vec![json!(tx_hash)])?;
            if !receipt.is_null() {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(AppError::ReceiptTimeout {
                    tx_hash: tx_hash.to_string(),
                    timeout_ms: self.timeout_ms,
                });
            }
            log::debug!("レシート未着のため待機します: tx={}", tx_hash);
            thread::sleep(RECEIPT_POLL_INTERVAL);
        }
    }
}

impl Deployer for RpcDeployer {
    fn accounts(&self) -> Result<Vec<EthAddress>, AppError> {
        let result = self.client.call("eth_accounts", vec![])?;
        let raw = result.as_array().ok_or_else(|| {
            AppError::Internal(format!("eth_accountsの応答が配列ではありません: {}", result))
        })?;
        let mut accounts = Vec::with_capacity(raw.len());
        for value in raw {
            let s = value.as_str().ok_or_else(|| {
                AppError::Internal(format!("eth_accountsの要素が文字列ではありません: {}", value))
            })?;
            accounts.push(EthAddress::parse(s)?);
        }
        Ok(accounts)
    }

    fn create(
        &self,
        contract: &ContractArtifact,
        from: &EthAddress,
        args: &[ConstructorArg],
    ) -> Result<DeployedInstance, AppError> {
        let data = creation_payload(contract, args)?;
        log::debug!("デプロイペイロード: {} バイト", (data.len() - 2) / 2);

        let tx = json!({ "from": from.as_str(), "data": data });
        let result = self.client.call("eth_sendTransaction", vec![tx])?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "eth_sendTransactionの応答が文字列ではありません: {}",
                    result
                ))
            })?
            .to_string();
        log::info!("コントラクト作成トランザクションを送信しました: tx={}", tx_hash);

        let receipt = self.wait_for_receipt(&tx_hash)?;
        decode_receipt(&tx_hash, &receipt)
    }
}

/// creation bytecode + エンコード済みコンストラクタ引数 = デプロイペイロード (0x-hex)
pub fn creation_payload(
    contract: &ContractArtifact,
    args: &[ConstructorArg],
) -> Result<String, AppError> {
    let mut data = contract.creation_code()?;
    for arg in args {
        data.extend_from_slice(&encode_word(arg));
    }
    Ok(format!("0x{}", hex::encode(data)))
}

/// コンストラクタ引数1個を32バイトワードにエンコードする。
/// 4引数とも静的型のため、ワードの連結がそのままABIエンコーディングになる。
pub fn encode_word(arg: &ConstructorArg) -> [u8; 32] {
    let mut word = [0u8; 32];
    match arg {
        ConstructorArg::Address(address) => word[12..].copy_from_slice(&address.bytes()),
        ConstructorArg::Hash32(root) => word.copy_from_slice(root.as_bytes()),
        ConstructorArg::Uint(value) => word[24..].copy_from_slice(&value.to_be_bytes()),
    }
    word
}

/// レシートからデプロイ結果を取り出す。
/// status != 0x1 (revert) と contractAddress 欠落はデプロイ失敗として扱う。
fn decode_receipt(tx_hash: &str, receipt: &Value) -> Result<DeployedInstance, AppError> {
    if let Some(status) = receipt.get("status").and_then(Value::as_str) {
        if parse_quantity(status)? == 0 {
            return Err(AppError::DeploymentFailed(format!(
                "コントラクト作成トランザクションがrevertしました (tx={})",
                tx_hash
            )));
        }
    }

    let address = receipt
        .get("contractAddress")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::DeploymentFailed(format!("レシートにcontractAddressがありません (tx={})", tx_hash))
        })?;

    let gas_used = match receipt.get("gasUsed").and_then(Value::as_str) {
        Some(quantity) => Some(parse_quantity(quantity)?),
        None => None,
    };

    Ok(DeployedInstance {
        address: EthAddress::parse(address)?,
        transaction_hash: tx_hash.to_string(),
        gas_used,
    })
}

/// "0x..." 形式の数量をu64にデコードする
fn parse_quantity(quantity: &str) -> Result<u64, AppError> {
    let hex_part = quantity.strip_prefix("0x").unwrap_or(quantity);
    u64::from_str_radix(hex_part, 16)
        .map_err(|e| AppError::Internal(format!("数量のデコードに失敗 ({}): {}", quantity, e)))
}
