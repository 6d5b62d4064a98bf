//! Scene clue batches.
//!
//! Each clue is sampled independently: type, name, position, an icon from the
//! image façade and a knowledge blurb from the language model. Remote failures
//! degrade a single clue's content and never shorten the batch.

use futures_util::future::BoxFuture;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::image::ImageFacade;
use crate::llm::error::ProviderError;
use crate::llm::provider::ProviderKind;
use crate::llm::LanguageModel;
use crate::schema::asset::{Asset, AssetType};
use crate::schema::clue::Clue;
use crate::schema::scene::new_id;
use crate::schema::npc::{Persona, Position};

pub const CLUE_TYPES: [&str; 5] = ["文献", "物品", "符号", "痕迹", "装置"];
pub const POSITION_MIN: f64 = 10.0;
pub const POSITION_MAX: f64 = 90.0;
pub const GENERIC_KNOWLEDGE: &str = "这是一个重要的线索，收集它可以帮助你解开游戏中的谜题。";

const MAX_KEYWORDS: usize = 5;
const ANALYSIS_PROMPT_CHARS: usize = 50;

/// What an image analysis found.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnalysis {
    pub description: String,
    pub objects: Vec<String>,
}

pub trait ContentAnalyzer: Send + Sync {
    fn analyze<'a>(&'a self, image_ref: &'a str) -> BoxFuture<'a, Result<ImageAnalysis, ProviderError>>;
}

/// Fixed analysis; stands in until a vision backend exists.
pub struct SimulatedAnalyzer;

impl ContentAnalyzer for SimulatedAnalyzer {
    fn analyze<'a>(&'a self, _image_ref: &'a str) -> BoxFuture<'a, Result<ImageAnalysis, ProviderError>> {
        Box::pin(async {
            Ok(ImageAnalysis {
                description: "这是一张包含多种元素的图片，可能包含风景、人物或物体等视觉元素".to_string(),
                objects: ["风景", "建筑", "人物", "自然元素"].map(String::from).to_vec(),
            })
        })
    }
}

fn clue_names(clue_type: &str) -> &'static [&'static str] {
    match clue_type {
        "文献" => &["古老书籍", "残破信件", "石碑铭文", "羊皮纸", "日记残页"],
        "物品" => &["金属碎片", "特殊工具", "陶瓷碎片", "布料残片", "奇怪装置"],
        "符号" => &["壁画符号", "地面刻痕", "门上标记", "柱子图案", "天花板符号"],
        "痕迹" => &["脚印", "血迹", "灰烬", "水渍", "手印"],
        "装置" => &["机械装置", "按钮开关", "控制面板", "仪表盘", "机关部件"],
        _ => &[],
    }
}

fn clue_description(clue_type: &str) -> &'static str {
    match clue_type {
        "文献" => "一本看起来很古老的书，页面已经泛黄，有些文字已经模糊不清。",
        "物品" => "一个看起来不属于这里的物品，似乎有特殊用途。",
        "符号" => "墙上刻着奇怪的符号，可能代表某种古代语言或标记。",
        "痕迹" => "地面上有明显的痕迹，似乎有人最近来过这里。",
        "装置" => "一个复杂的机械装置，上面有几个按钮和指示灯。",
        _ => "一个值得仔细查看的线索。",
    }
}

/// Knowledge text used when the model cannot be reached.
pub fn default_knowledge(clue_type: &str) -> &'static str {
    match clue_type {
        "文献" => "古代文献通常使用特殊的墨水书写，有些甚至使用隐形墨水，需要特殊处理才能显现。羊皮纸是古代常用的书写材料，由动物皮制成，比纸更耐用。",
        "物品" => "通过物品的材质、工艺和样式，考古学家可以判断其年代和用途。不同文明有不同的工艺特色，这些特色反映了当时的技术水平和审美观念。",
        "符号" => "古代符号系统是研究古代文明的重要途径。许多符号不仅有字面意义，还包含宗教、文化和历史信息。符号学是专门研究符号和象征的学科。",
        "痕迹" => "痕迹证据在考古学和法医学中非常重要。脚印可以告诉我们来人的身高、体重和行走方式；残留物可以分析出化学成分和来源。",
        "装置" => "古代机械装置展示了惊人的工程智慧。例如，安提基特拉机械是古希腊的天文计算机，能够预测天体位置和日食月食。",
        _ => GENERIC_KNOWLEDGE,
    }
}

/// Icon prompt for a clue, optionally biased by an image analysis.
pub fn icon_prompt(name: &str, clue_type: &str, analysis: Option<&ImageAnalysis>) -> String {
    let mut prompt = format!("{}, {}, game clue icon, simple style, flat design", name, clue_type);
    if let Some(a) = analysis.filter(|a| !a.description.is_empty()) {
        prompt.push_str(", ");
        prompt.extend(a.description.chars().take(ANALYSIS_PROMPT_CHARS));
    }
    prompt
}

pub struct ClueGenerator<'a> {
    llm: &'a LanguageModel,
    images: &'a ImageFacade,
    analyzer: &'a dyn ContentAnalyzer,
}

impl<'a> ClueGenerator<'a> {
    pub fn new(llm: &'a LanguageModel, images: &'a ImageFacade) -> Self {
        Self {
            llm,
            images,
            analyzer: &SimulatedAnalyzer,
        }
    }

    pub fn with_analyzer(mut self, analyzer: &'a dyn ContentAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Exactly `count` uncollected clues with positions in `[10, 90]`.
    pub async fn generate(&self, count: usize, knowledge_base: &[Asset], rng: &mut StdRng) -> Vec<Clue> {
        let analysis = self.analyze_first_image(knowledge_base).await;

        let mut clues = Vec::with_capacity(count);
        for _ in 0..count {
            let clue_type = *CLUE_TYPES.choose(rng).unwrap_or(&CLUE_TYPES[0]);
            let x = rng.gen_range(POSITION_MIN..=POSITION_MAX);
            let y = rng.gen_range(POSITION_MIN..=POSITION_MAX);

            let mut name = clue_names(clue_type)
                .choose(rng)
                .copied()
                .unwrap_or(clue_type)
                .to_string();
            if let Some(a) = analysis.as_ref().filter(|a| !a.objects.is_empty()) {
                if rng.gen_bool(0.5) {
                    if let Some(object) = a.objects.choose(rng) {
                        match clue_type {
                            "物品" => name = format!("{}碎片", object),
                            "符号" => name = format!("{}相关符号", object),
                            _ => {}
                        }
                    }
                }
            }

            let prompt = icon_prompt(&name, clue_type, analysis.as_ref());
            let image_url = self.images.generate_image(&prompt, &[]).await;
            let knowledge = self.clue_knowledge(knowledge_base, clue_type).await;

            clues.push(Clue::new(
                new_id("clue"),
                name,
                clue_description(clue_type),
                Position::new(x, y),
                image_url,
                knowledge,
            ));
        }
        clues
    }

    /// A short knowledge blurb for `clue_type`, grounded on the knowledge-base names.
    pub async fn clue_knowledge(&self, knowledge_base: &[Asset], clue_type: &str) -> String {
        let keywords: Vec<&str> = knowledge_base
            .iter()
            .map(|a| a.name.trim())
            .filter(|n| !n.is_empty())
            .take(MAX_KEYWORDS)
            .collect();
        let prompt = format!(
            "基于以下知识库关键词({})，为\"{}\"类型的游戏线索生成一段100字左右的相关知识科普内容:",
            keywords.join(", "),
            clue_type
        );
        let expert = Persona::new("知识科普专家", "游戏知识顾问", "专业", "简洁");

        match self
            .llm
            .try_converse(&expert, &prompt, Some(ProviderKind::DeepSeek))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("clue knowledge for {} failed: {}", clue_type, e);
                default_knowledge(clue_type).to_string()
            }
        }
    }

    async fn analyze_first_image(&self, knowledge_base: &[Asset]) -> Option<ImageAnalysis> {
        let image = knowledge_base.iter().find(|a| a.asset_type == AssetType::Image)?;
        let image_ref = image.preview.as_deref().unwrap_or(&image.name);
        match self.analyzer.analyze(image_ref).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                log::warn!("image analysis of {} failed: {}", image.name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PLACEHOLDER_BASE;
    use crate::schema::asset::{AssetUpload, ImageCategory};
    use rand::SeedableRng;

    fn image_asset() -> Asset {
        let mut asset = Asset::from_upload(AssetUpload {
            name: "主角立绘.png".to_string(),
            mime_type: "image/png".to_string(),
            byte_len: 2048,
            image_category: Some(ImageCategory::Character),
            preview: Some("https://cdn.test/hero.png".to_string()),
        });
        asset.classify();
        asset
    }

    #[test]
    fn icon_prompt_truncates_analysis() {
        let analysis = ImageAnalysis {
            description: "长".repeat(80),
            objects: vec![],
        };
        let prompt = icon_prompt("脚印", "痕迹", Some(&analysis));
        assert!(prompt.starts_with("脚印, 痕迹, game clue icon, simple style, flat design, "));
        assert!(prompt.ends_with(&"长".repeat(50)));
        assert!(!prompt.ends_with(&"长".repeat(51)));
    }

    #[tokio::test]
    async fn exact_count_and_bounds_when_offline_fails() {
        let llm = LanguageModel::new(ProviderKind::Coze, 0);
        let images = ImageFacade::offline(DEFAULT_PLACEHOLDER_BASE);
        let gen = ClueGenerator::new(&llm, &images);
        let mut rng = StdRng::seed_from_u64(17);

        for count in [0usize, 1, 5] {
            let clues = gen.generate(count, &[image_asset()], &mut rng).await;
            assert_eq!(clues.len(), count);
            let mut ids: Vec<&str> = clues.iter().map(|c| c.id.as_str()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), count);
            for clue in &clues {
                assert!((POSITION_MIN..=POSITION_MAX).contains(&clue.position.x));
                assert!((POSITION_MIN..=POSITION_MAX).contains(&clue.position.y));
                assert!(!clue.is_collected());
                assert!(!clue.knowledge.is_empty());
                assert!(clue.image_url.starts_with(DEFAULT_PLACEHOLDER_BASE));
            }
        }
    }

    #[tokio::test]
    async fn batches_never_share_ids() {
        let llm = LanguageModel::new(ProviderKind::Coze, 0);
        let images = ImageFacade::offline(DEFAULT_PLACEHOLDER_BASE);
        let gen = ClueGenerator::new(&llm, &images);
        let mut rng = StdRng::seed_from_u64(2);

        let mut clues = gen.generate(3, &[], &mut rng).await;
        clues.extend(gen.generate(3, &[], &mut rng).await);
        let mut ids: Vec<&str> = clues.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(clues.iter().all(|c| c.id.starts_with("clue_")));
    }

    #[tokio::test]
    async fn knowledge_falls_back_per_type() {
        let llm = LanguageModel::new(ProviderKind::Coze, 0);
        let images = ImageFacade::offline(DEFAULT_PLACEHOLDER_BASE);
        let gen = ClueGenerator::new(&llm, &images);
        for t in CLUE_TYPES {
            assert_eq!(gen.clue_knowledge(&[], t).await, default_knowledge(t));
        }
        assert_eq!(gen.clue_knowledge(&[], "其他").await, GENERIC_KNOWLEDGE);
    }

    struct BrokenAnalyzer;

    impl ContentAnalyzer for BrokenAnalyzer {
        fn analyze<'a>(&'a self, _: &'a str) -> BoxFuture<'a, Result<ImageAnalysis, ProviderError>> {
            Box::pin(async { Err(ProviderError::Transport("offline".to_string())) })
        }
    }

    #[tokio::test]
    async fn analyzer_failure_is_isolated() {
        let llm = LanguageModel::offline(0);
        let images = ImageFacade::offline(DEFAULT_PLACEHOLDER_BASE);
        let gen = ClueGenerator::new(&llm, &images).with_analyzer(&BrokenAnalyzer);
        let clues = gen.generate(3, &[image_asset()], &mut StdRng::seed_from_u64(1)).await;
        assert_eq!(clues.len(), 3);
        for clue in &clues {
            assert!(!clue.image_url.contains("%E8%BF%99"));
        }
    }
}
