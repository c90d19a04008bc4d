use clap::Parser;

mod cli;
mod config;
mod deploy;
mod error;
mod network;
mod rpc;
mod types;

use cli::CliArgs;
use config::{ContractArtifact, MerkleTreeFixture, UtxoRecord};
use deploy::Deployer;
use error::AppError;
use network::RunnerOptions;
use rpc::RpcDeployer;

fn main() -> Result<(), AppError> {
    env_logger::init();

    let args = CliArgs::parse();
    log::info!("デプロイツールを開始します。引数: {:?}", args);

    let options = RunnerOptions::from_env();
    log::debug!("実行オプション: {:?}", options);

    // 入力の読み込みと事前検証 (どれかが不正ならデプロイを試みる前に終了)
    let contract: ContractArtifact = config::read_json_file(&args.contract_file)?;
    contract.validate()?;
    let utxos: Vec<UtxoRecord> = config::read_json_file(&args.utxo_file)?;
    let merkle: MerkleTreeFixture = config::read_json_file(&args.merkle_file)?;
    log::info!(
        "フィクスチャを読み込みました: UTXO {} 件, root={}",
        utxos.len(),
        merkle.root
    );

    // ネットワーク解決 (WalletProvider型の場合のみここでsecretsを読む)
    let entry = network::find_network(&args.network)?;
    let connection = network::resolve_connection(entry, &args.secrets_file)?;

    // ノード接続とネットワークID照合
    let deployer = RpcDeployer::connect(&connection, &options)?;

    // デプロイ元アカウント (accounts[0])
    let accounts = deployer.accounts()?;
    let origin = accounts.first().cloned().ok_or(AppError::NoAccounts)?;
    log::info!("デプロイ元アカウント: {}", origin);

    let params = deploy::derive_deploy_params(origin, &merkle, &utxos)?;

    let artifact_path = args
        .output_file
        .clone()
        .unwrap_or_else(|| contract.default_artifact_path());
    let instance = deploy::run_deployment(&deployer, &contract, &params, &artifact_path, &options)?;

    log::info!(
        "処理が正常に完了しました。コントラクトアドレス: {}",
        instance.address
    );
    Ok(())
}
