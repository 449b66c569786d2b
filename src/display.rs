//! キャラクターと表示設定（背景色・文字色・画像ファイル名）

use serde::Serialize;

/// 既定の背景色（ダークチャコール）
pub const DEFAULT_BACKGROUND_COLOR: &str = "#2c3e50";
/// 既定の文字色
pub const DEFAULT_TEXT_COLOR: &str = "white";

/// 診断結果として返るキャラクター
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Character {
    PhilDunphy,
    CameronTucker,
    SheldonCooper,
    RonSwanson,
    JohanLiebert,
    Nezuko,
    MoiraRose,
    WalterWhite,
    SherlockHolmes,
    Batman,
    PeterGriffin,
    Daenerys,
    AndyDwyer,
    JethalalGada,
    ChandlerBing,
    MichaelScott,
}

/// キャラクター数
pub const NUM_CHARACTERS: usize = 16;

impl Character {
    /// 学習データ生成時の順序
    pub const ALL: [Character; NUM_CHARACTERS] = [
        Character::PhilDunphy,
        Character::CameronTucker,
        Character::SheldonCooper,
        Character::RonSwanson,
        Character::JohanLiebert,
        Character::Nezuko,
        Character::MoiraRose,
        Character::WalterWhite,
        Character::SherlockHolmes,
        Character::Batman,
        Character::PeterGriffin,
        Character::Daenerys,
        Character::AndyDwyer,
        Character::JethalalGada,
        Character::ChandlerBing,
        Character::MichaelScott,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Character::PhilDunphy => "Phil Dunphy",
            Character::CameronTucker => "Cameron Tucker",
            Character::SheldonCooper => "Sheldon Cooper",
            Character::RonSwanson => "Ron Swanson",
            Character::JohanLiebert => "Johan Liebert",
            Character::Nezuko => "Nezuko",
            Character::MoiraRose => "Moira Rose",
            Character::WalterWhite => "Walter White",
            Character::SherlockHolmes => "Sherlock Holmes",
            Character::Batman => "Batman",
            Character::PeterGriffin => "Peter Griffin",
            Character::Daenerys => "Daenerys",
            Character::AndyDwyer => "Andy Dwyer",
            Character::JethalalGada => "Jethalal Gada",
            Character::ChandlerBing => "Chandler Bing",
            Character::MichaelScott => "Michael Scott",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// 背景色
    fn background(self) -> &'static str {
        match self {
            Character::WalterWhite => "#F4D03F",
            Character::MichaelScott => "#D6EAF8",
            Character::Nezuko => "#F9EBEA",
            Character::SheldonCooper => "#E8DAEF",
            Character::JohanLiebert => "#FADBD8",
            Character::MoiraRose => "#FCF3CF",
            Character::PhilDunphy => "#D1F2EB",
            Character::CameronTucker => "#FADBD8",
            Character::RonSwanson => "#FDEDEC",
            Character::SherlockHolmes => "#EAECEE",
            Character::Batman => "#D5DBDB",
            Character::PeterGriffin => "#F6DDCC",
            Character::Daenerys => "#EBDEF0",
            Character::AndyDwyer => "#FEF9E7",
            Character::JethalalGada => "#FCF3CF",
            Character::ChandlerBing => "#E8F8F5",
        }
    }

    pub fn display_hint(self) -> DisplayHint {
        DisplayHint {
            background: self.background(),
            text: "black",
        }
    }
}

/// 表示色の組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayHint {
    pub background: &'static str,
    pub text: &'static str,
}

impl Default for DisplayHint {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND_COLOR,
            text: DEFAULT_TEXT_COLOR,
        }
    }
}

/// 名前から表示色を引く（未知の名前は既定色）
pub fn display_hint_for(name: &str) -> DisplayHint {
    match Character::from_name(name) {
        Some(character) => character.display_hint(),
        None => DisplayHint::default(),
    }
}

/// 画像ファイル名: 小文字化し空白をアンダースコアに置換して拡張子を付ける
///
/// 例: "Walter White" -> "walter_white.png"
pub fn image_file_name(name: &str, extension: &str) -> String {
    format!("{}.{}", name.replace(' ', "_").to_lowercase(), extension)
}
