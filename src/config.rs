use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;

/// test_utxo_set/utxo.json の1レコード。
/// 消費するのは satoshis のみで、その他のフィールドは読み飛ばす。
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UtxoRecord {
    pub satoshis: u64, // 非負はu64で担保される (負値はパースエラー)
}

/// test_utxo_set/merkleTree.json。root 以外のフィールドは読み飛ばす。
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MerkleTreeFixture {
    pub root: String,
}

/// Truffle形式のビルドアーティファクト (build/contracts/<Name>.json)。
/// abi は解釈せず、そのままアーティファクトとして書き出すだけ。
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Value,
    pub bytecode: String,
}

impl ContractArtifact {
    /// デプロイ前の事前検証。不正ならデプロイを試みる前に終了する。
    pub fn validate(&self) -> Result<(), AppError> {
        if self.contract_name.is_empty() {
            return Err(AppError::InputValidation(
                "contractNameが空です".to_string(),
            ));
        }
        if !self.abi.is_array() {
            return Err(AppError::InputValidation(format!(
                "abiが配列ではありません: コントラクト {}",
                self.contract_name
            )));
        }
        self.creation_code().map(|_| ())
    }

    /// デプロイペイロード先頭となるcreation bytecode
    pub fn creation_code(&self) -> Result<Vec<u8>, AppError> {
        let hex_part = self.bytecode.strip_prefix("0x").ok_or_else(|| {
            AppError::InputValidation(format!(
                "bytecodeに0xプレフィックスがありません: コントラクト {}",
                self.contract_name
            ))
        })?;
        if hex_part.is_empty() {
            return Err(AppError::InputValidation(format!(
                "bytecodeが空です: コントラクト {}",
                self.contract_name
            )));
        }
        hex::decode(hex_part).map_err(|e| {
            AppError::InputValidation(format!(
                "bytecodeのデコードに失敗 (コントラクト {}): {}",
                self.contract_name, e
            ))
        })
    }

    /// --output-file 省略時のアーティファクト出力パス
    pub fn default_artifact_path(&self) -> PathBuf {
        PathBuf::from(format!("{}-ABI.json", self.contract_name))
    }
}

/// secrets.json 全体 (ネットワーク名 → 資格情報)
pub type SecretsFile = HashMap<String, NetworkSecrets>;

/// 1ネットワーク分の資格情報。
/// 欠落・空をこちら側で検証してネットワーク名とフィールド名入りのエラーにするため、
/// あえて両フィールドを Option にしてある。
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSecrets {
    #[serde(default)]
    pub private_keys: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
}

/// JSONファイルを読み込んで T にデコードする。
/// 失敗はいずれも致命で、ファイルパス付きのエラーを返す。
pub fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let content = fs::read_to_string(path).map_err(|e| {
        log::error!("ファイルの読み込みに失敗しました: {:?}", path);
        AppError::Io(e)
    })?;
    serde_json::from_str(&content).map_err(|e| {
        log::error!("JSONのパースに失敗しました: {:?}", path);
        AppError::JsonParse {
            file_path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn artifact(bytecode: &str) -> ContractArtifact {
        ContractArtifact {
            contract_name: "BitcoinHEX".to_string(),
            abi: serde_json::json!([]),
            bytecode: bytecode.to_string(),
        }
    }

    #[test]
    fn utxo_record_parses_satoshis_and_ignores_extra_fields() {
        let json = r#"{"txid": "ab", "vout": 0, "satoshis": 12345}"#;
        let record: UtxoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.satoshis, 12345);
    }

    #[test]
    fn utxo_record_rejects_negative_satoshis() {
        let json = r#"{"satoshis": -1}"#;
        assert!(serde_json::from_str::<UtxoRecord>(json).is_err());
    }

    #[test]
    fn merkle_fixture_parses_root_and_ignores_extra_fields() {
        let json = r#"{"root": "0xabcd", "leaves": [1, 2, 3]}"#;
        let fixture: MerkleTreeFixture = serde_json::from_str(json).unwrap();
        assert_eq!(fixture.root, "0xabcd");
    }

    #[test]
    fn contract_artifact_parses_truffle_shape() {
        let json = r#"{
            "contractName": "BitcoinHEX",
            "abi": [{"type": "constructor", "inputs": []}],
            "bytecode": "0x6060"
        }"#;
        let artifact: ContractArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.contract_name, "BitcoinHEX");
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.creation_code().unwrap(), vec![0x60, 0x60]);
        assert_eq!(
            artifact.default_artifact_path(),
            PathBuf::from("BitcoinHEX-ABI.json")
        );
    }

    #[test]
    fn contract_artifact_rejects_bytecode_without_prefix() {
        let err = artifact("6060").validate().unwrap_err();
        assert!(matches!(err, AppError::InputValidation(_)));
    }

    #[test]
    fn contract_artifact_rejects_empty_bytecode() {
        let err = artifact("0x").validate().unwrap_err();
        assert!(matches!(err, AppError::InputValidation(_)));
    }

    #[test]
    fn contract_artifact_rejects_non_array_abi() {
        let bad = ContractArtifact {
            contract_name: "BitcoinHEX".to_string(),
            abi: serde_json::json!({"type": "constructor"}),
            bytecode: "0x6060".to_string(),
        };
        assert!(matches!(
            bad.validate().unwrap_err(),
            AppError::InputValidation(_)
        ));
    }

    #[test]
    fn secrets_fields_are_optional_at_parse_time() {
        let json = r#"{"kovan": {"url": "https://kovan.example"}}"#;
        let secrets: SecretsFile = serde_json::from_str(json).unwrap();
        let kovan = secrets.get("kovan").unwrap();
        assert!(kovan.private_keys.is_none());
        assert_eq!(kovan.url.as_deref(), Some("https://kovan.example"));
    }

    #[test]
    fn read_json_file_reports_parse_failure_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = read_json_file::<MerkleTreeFixture>(file.path()).unwrap_err();
        match err {
            AppError::JsonParse { file_path, .. } => assert_eq!(file_path, file.path()),
            other => panic!("想定外のエラー: {:?}", other),
        }
    }

    #[test]
    fn read_json_file_reports_missing_file_as_io() {
        let err = read_json_file::<MerkleTreeFixture>(Path::new("/no/such/fixture.json"))
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
