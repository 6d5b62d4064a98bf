use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::core::template::{fill, Bindings};
use crate::schema::npc::Persona;

const TAVERN_KEEPER: &[&str] = &[
    "想喝点什么吗？我们这儿有最好的麦酒。",
    "最近生意不太好啊，客人少了好多。",
    "想听个故事吗？我这儿可有不少奇闻异事。",
    "天气冷，来杯热酒暖暖身子吧。",
    "你看起来很疲惫，需要休息一下吗？",
];

const GUARD_CAPTAIN: &[&str] = &[
    "请出示你的通行证。",
    "最近城里不太平，晚上尽量不要外出。",
    "我们会保护市民的安全，请放心。",
    "有任何可疑情况，请立即报告。",
    "城门将在黄昏时分关闭，请留意时间。",
];

const MERCHANT: &[&str] = &[
    "看看吧，我这儿有最好的商品。",
    "需要买点什么吗？我的价格很公道。",
    "这个东西可是从远方运来的珍品。",
    "最近行情不太好，生意难做啊。",
    "要不要看看这个？很多人都喜欢呢。",
];

const GENERIC: &[&str] = &[
    "我是{name}，很高兴见到你。",
    "你好啊，有什么我可以帮忙的吗？",
    "关于这个地方，我知道不少事情。",
    "需要了解什么信息吗？",
    "今天天气不错，对吧？",
    "你从哪里来的？",
    "这个地方有很多秘密等着你发现。",
    "小心点，有些地方很危险。",
    "我在这里住了很久了。",
    "如果你需要帮助，可以来找我。",
];

/// Lines for `role`. Unrecognized roles, including 未知角色, use the generic table.
pub fn lines_for_role(role: &str) -> &'static [&'static str] {
    match role.trim() {
        "酒馆老板" => TAVERN_KEEPER,
        "卫兵队长" => GUARD_CAPTAIN,
        "商人" => MERCHANT,
        _ => GENERIC,
    }
}

/// A canned in-character line. Never empty.
pub fn fallback_reply(persona: &Persona, rng: &mut StdRng) -> String {
    let line = lines_for_role(&persona.role)
        .choose(rng)
        .copied()
        .unwrap_or(GENERIC[0]);
    let name = if persona.name.trim().is_empty() {
        "无名氏"
    } else {
        persona.name.as_str()
    };
    fill(line, &Bindings::new().with("name", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn role_tables() {
        assert!(lines_for_role("商人").contains(&"看看吧，我这儿有最好的商品。"));
        assert_eq!(lines_for_role("炼金术士").len(), 10);
        assert_eq!(lines_for_role("").len(), 10);
    }

    #[test]
    fn reply_is_from_role_table() {
        let mut rng = StdRng::seed_from_u64(11);
        let persona = Persona::new("赵大", "卫兵队长", "严肃", "简洁");
        for _ in 0..10 {
            let reply = fallback_reply(&persona, &mut rng);
            assert!(GUARD_CAPTAIN.contains(&reply.as_str()));
        }
    }

    #[test]
    fn generic_reply_names_the_npc() {
        let mut rng = StdRng::seed_from_u64(0);
        let persona = Persona::new("阿青", "药师", "中立", "标准");
        let replies: Vec<String> = (0..200).map(|_| fallback_reply(&persona, &mut rng)).collect();
        assert!(replies.iter().all(|r| !r.is_empty() && !r.contains('{')));
        assert!(replies.iter().any(|r| r == "我是阿青，很高兴见到你。"));
    }
}
