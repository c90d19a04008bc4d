use std::fs;
use std::path::Path;

use bitcoin::Amount;
use serde_json::Value;

use crate::config::{ContractArtifact, MerkleTreeFixture, UtxoRecord};
use crate::error::AppError;
use crate::network::{Reporter, RunnerOptions};
use crate::types::{ConstructorArg, DeployedInstance, EthAddress, MerkleRoot};

// フォーク時点のUTXOセット総額がこれを超えることはない (21,000,000 BTC)
const MAX_MONEY_SATS: u64 = 21_000_000 * 100_000_000;

/// BitcoinHEXコンストラクタへ渡す4パラメータ。
/// 順序は (originAddress, rootUTXOMerkleTreeHash, maximumRedeemable, UTXOCountAtFork) で固定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployParams {
    pub origin_address: EthAddress,
    pub root_utxo_merkle_tree_hash: MerkleRoot,
    pub maximum_redeemable: Amount,
    pub utxo_count_at_fork: u64,
}

impl DeployParams {
    /// コンストラクタ引数列 (固定順)
    pub fn constructor_args(&self) -> Vec<ConstructorArg> {
        vec![
            ConstructorArg::Address(self.origin_address.clone()),
            ConstructorArg::Hash32(self.root_utxo_merkle_tree_hash.clone()),
            ConstructorArg::Uint(self.maximum_redeemable.to_sat()),
            ConstructorArg::Uint(self.utxo_count_at_fork),
        ]
    }
}

/// コントラクト作成を1回発行する能力インターフェース。
/// デプロイフローはこのtraitのみに依存し、特定のチェーンツールには依存しない。
pub trait Deployer {
    /// 接続先が保持するアカウント一覧 (先頭がデプロイ元になる)
    fn accounts(&self) -> Result<Vec<EthAddress>, AppError>;

    /// from からコントラクト作成を発行し、完了まで待つ
    fn create(
        &self,
        contract: &ContractArtifact,
        from: &EthAddress,
        args: &[ConstructorArg],
    ) -> Result<DeployedInstance, AppError>;
}

/// フィクスチャからデプロイパラメータを導出する。
pub fn derive_deploy_params(
    origin_address: EthAddress,
    merkle: &MerkleTreeFixture,
    utxos: &[UtxoRecord],
) -> Result<DeployParams, AppError> {
    let root = MerkleRoot::parse(&merkle.root)?;

    // 償還可能総額 = 全UTXOのsatoshis合計。加算順に依存しないが、オーバーフローは即エラー。
    let mut maximum_redeemable = Amount::ZERO;
    for (index, utxo) in utxos.iter().enumerate() {
        maximum_redeemable = match maximum_redeemable.checked_add(Amount::from_sat(utxo.satoshis)) {
            Some(total) => total,
            None => {
                return Err(AppError::AmountOverflow {
                    accumulated: maximum_redeemable.to_sat(),
                    satoshis: utxo.satoshis,
                    index,
                });
            }
        };
    }
    if maximum_redeemable.to_sat() > MAX_MONEY_SATS {
        log::warn!(
            "償還可能総額 {} sats が21,000,000 BTCを超えています。フィクスチャの内容を確認してください。",
            maximum_redeemable.to_sat()
        );
    }

    let utxo_count_at_fork = utxos.len() as u64;
    log::debug!(
        "導出パラメータ: root={}, maximumRedeemable={} sats, utxoCountAtFork={}",
        root,
        maximum_redeemable.to_sat(),
        utxo_count_at_fork
    );

    Ok(DeployParams {
        origin_address,
        root_utxo_merkle_tree_hash: root,
        maximum_redeemable,
        utxo_count_at_fork,
    })
}

/// デプロイ本体。コントラクト作成 → ABIアーティファクト書き出し → (設定時のみ)ガスレポート。
/// 作成が失敗した場合はアーティファクトを一切書き出さずに終了する。
pub fn run_deployment(
    deployer: &dyn Deployer,
    contract: &ContractArtifact,
    params: &DeployParams,
    artifact_path: &Path,
    options: &RunnerOptions,
) -> Result<DeployedInstance, AppError> {
    log::info!(
        "コントラクト {} のデプロイを開始します: origin={}, root={}, maximumRedeemable={} sats, utxoCountAtFork={}",
        contract.contract_name,
        params.origin_address,
        params.root_utxo_merkle_tree_hash,
        params.maximum_redeemable.to_sat(),
        params.utxo_count_at_fork
    );

    // 1. コントラクト作成 (送信元 = originアドレス = accounts[0])
    let instance = deployer.create(contract, &params.origin_address, &params.constructor_args())?;
    log::info!(
        "コントラクト作成が完了しました: address={}, tx={}",
        instance.address,
        instance.transaction_hash
    );

    // 2. ABIアーティファクトの書き出し (既存ファイルは上書き)
    write_json_file(artifact_path, &contract.abi)?;
    log::info!("ABIアーティファクトを {:?} に保存しました。", artifact_path);

    // 3. ガスレポート (GAS_REPORTER設定時のみ)
    if options.reporter == Reporter::Gas {
        report_gas(&instance, options);
    }

    Ok(instance)
}

fn report_gas(instance: &DeployedInstance, options: &RunnerOptions) {
    match instance.gas_used {
        Some(gas_used) => {
            // コスト(ETH) = gasUsed × gasPrice(gwei) ÷ 1e9
            let cost_eth = gas_used as f64 * options.gas_price_gwei as f64 / 1_000_000_000.0;
            log::info!(
                "ガスレポート: gasUsed={}, gasPrice={} gwei, 概算コスト={:.6} ETH (通貨設定: {})",
                gas_used,
                options.gas_price_gwei,
                cost_eth,
                options.currency
            );
        }
        None => {
            log::warn!("ガスレポートが要求されましたが、レシートにgasUsedがありませんでした。");
        }
    }
}

/// JSONを2スペースインデントで書き出す (既存ファイルは上書き)。
pub fn write_json_file(path: &Path, json: &Value) -> Result<(), AppError> {
    let pretty = serde_json::to_string_pretty(json)
        .map_err(|e| AppError::Internal(format!("JSONのシリアライズに失敗: {}", e)))?;
    fs::write(path, pretty).map_err(|e| {
        log::error!("アーティファクトの書き込みに失敗しました: {:?}", path);
        AppError::Io(e)
    })
}
