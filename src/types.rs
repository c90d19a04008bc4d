use std::fmt;

use crate::error::AppError;

/// デプロイ元・デプロイ先となるEthereumアドレス (0x + 40桁hex)。
/// 入力文字列と検証済みの20バイト値を併せて保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthAddress {
    text: String,
    bytes: [u8; 20],
}

impl EthAddress {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let hex_part = s.strip_prefix("0x").ok_or_else(|| {
            AppError::InputValidation(format!("アドレスに0xプレフィックスがありません: {}", s))
        })?;
        let decoded = hex::decode(hex_part)
            .map_err(|e| AppError::InputValidation(format!("アドレスのデコードに失敗 ({}): {}", s, e)))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| AppError::InputValidation(format!("アドレス長が20バイトではありません: {}", s)))?;
        Ok(EthAddress {
            text: s.to_string(),
            bytes,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// ABIワードエンコード用の生バイト列
    pub fn bytes(&self) -> [u8; 20] {
        self.bytes
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// UTXOセット全体を要約するMerkleルート。
/// 32バイトのハッシュ値であることだけを検証し、それ以上の解釈はせず不透明に引き渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleRoot([u8; 32]);

impl MerkleRoot {
    /// "0x"プレフィックスは任意。64桁のhexでなければエラー。
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(hex_part).map_err(|e| AppError::MerkleRootFormat {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|rest: Vec<u8>| AppError::MerkleRootFormat {
            value: s.to_string(),
            reason: format!("長さが32バイトではありません ({} バイト)", rest.len()),
        })?;
        Ok(MerkleRoot(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// ネットワーク設定のID指定。Any ('*') はノードが報告するどのIDとも一致する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkId {
    Any,
    Id(u64),
}

impl NetworkId {
    /// ノードが報告したID (net_versionの10進文字列) と一致するか
    pub fn matches(&self, reported: &str) -> bool {
        match self {
            NetworkId::Any => true,
            NetworkId::Id(id) => reported == id.to_string(),
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::Any => f.write_str("*"),
            NetworkId::Id(id) => write!(f, "{}", id),
        }
    }
}

/// コンストラクタ引数。BitcoinHEXの4引数は全て静的型のため、
/// 1引数 = 32バイトワード1個としてエンコードできる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArg {
    /// 20バイトアドレス (左ゼロ詰め)
    Address(EthAddress),
    /// 32バイトハッシュ値 (そのまま)
    Hash32(MerkleRoot),
    /// 符号なし整数 (ビッグエンディアン、左ゼロ詰め)
    Uint(u64),
}

/// コントラクト作成完了後のインスタンス情報
#[derive(Debug, Clone)]
pub struct DeployedInstance {
    pub address: EthAddress,
    pub transaction_hash: String,
    pub gas_used: Option<u64>,
}
