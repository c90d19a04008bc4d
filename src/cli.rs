use clap::Parser;
use std::path::PathBuf;

/// BitcoinHEXコントラクトのデプロイを1回実行するCLI。
/// 各パスの既定値はTruffleプロジェクトの標準配置に合わせてある。
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// ビルドアーティファクト (contractName/abi/bytecode) のJSONファイルへのパス
    #[clap(short, long, value_parser, default_value = "build/contracts/BitcoinHEX.json")]
    pub contract_file: PathBuf,

    /// UTXOリストのJSONフィクスチャへのパス
    #[clap(short, long, value_parser, default_value = "test_utxo_set/utxo.json")]
    pub utxo_file: PathBuf,

    /// MerkleツリーディスクリプタのJSONフィクスチャへのパス
    #[clap(short, long, value_parser, default_value = "test_utxo_set/merkleTree.json")]
    pub merkle_file: PathBuf,

    /// デプロイ先ネットワーク名 ("dev", "kovan")
    #[clap(short, long, value_parser, default_value = "dev")]
    pub network: String,

    /// 資格情報ファイルへのパス (WalletProvider型ネットワークでのみ読まれる)
    #[clap(short, long, value_parser, default_value = "secrets.json")]
    pub secrets_file: PathBuf,

    /// ABIアーティファクトの出力先 (省略時は <contractName>-ABI.json)
    #[clap(short, long, value_parser)]
    pub output_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_truffle_project_layout() {
        let args = CliArgs::parse_from(["bitcoinhex-deploy-cli"]);
        assert_eq!(
            args.contract_file,
            PathBuf::from("build/contracts/BitcoinHEX.json")
        );
        assert_eq!(args.utxo_file, PathBuf::from("test_utxo_set/utxo.json"));
        assert_eq!(
            args.merkle_file,
            PathBuf::from("test_utxo_set/merkleTree.json")
        );
        assert_eq!(args.network, "dev");
        assert_eq!(args.secrets_file, PathBuf::from("secrets.json"));
        assert!(args.output_file.is_none());
    }

    #[test]
    fn network_and_output_can_be_overridden() {
        let args = CliArgs::parse_from([
            "bitcoinhex-deploy-cli",
            "--network",
            "kovan",
            "--output-file",
            "out/abi.json",
        ]);
        assert_eq!(args.network, "kovan");
        assert_eq!(args.output_file, Some(PathBuf::from("out/abi.json")));
    }
}
