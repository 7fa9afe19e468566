//! Weirdness heuristic: a flat keyword-presence count over the title and the head of the body,
//! a small bonus for substantial bodies, and a heavy penalty for sensitive topics.

use regex::Regex;
use std::sync::LazyLock;

/// Candidates scoring below this are discarded, not deprioritized.
pub const MIN_SCORE: i32 = 1;

/// Only this many leading characters of the body are inspected.
pub const BODY_SCAN_CHARS: usize = 1200;

/// Bodies longer than this (in characters) earn one extra point.
pub const SUBSTANCE_CHARS: usize = 300;

/// Large enough to push any sensitive item below `MIN_SCORE` whatever its keyword hits.
pub const SENSITIVE_PENALTY: i32 = 5;

/// Case-insensitive substrings, each worth at most one point.
pub const LEXICON: &[&str] = &[
    // Core "weird" words
    "weird", "odd", "bizarre", "unusual", "strange", "peculiar", "quirky", "surreal", "eccentric",
    "offbeat", "freaky", "curious", "unexplained", "mystery", "mysterious", "unorthodox",
    "outlandish", "zany", "whimsical", "wacky", "absurd", "nonsensical", "ridiculous", "hilarious",
    "comic", "comical", "satire", "spoof", "parody", "peculiarity", "anomaly", "curio", "oddity",
    // Animals & creatures
    "escaped", "zoo", "animal", "wildlife", "bear", "goat", "cow", "chicken", "duck", "ostrich",
    "emu", "kangaroo", "koala", "llama", "alpaca", "sheep", "pig", "boar", "squirrel", "otter",
    "penguin", "parrot", "macaw", "cockatoo", "pigeon", "rat", "snake", "python", "cobra",
    "alligator", "crocodile", "frog", "toad", "turtle", "tortoise", "lizard", "iguana", "gecko",
    "shark", "whale", "dolphin", "seal", "octopus", "squid", "crab", "lobster", "spider",
    "tarantula", "scorpion", "bee", "wasp", "hornet", "insect", "beetle", "moth", "butterfly",
    "moose", "reindeer", "hedgehog", "badger", "raccoon", "opossum", "beaver", "walrus", "mantis",
    "ferret", "hamster", "cat", "kitten", "dog", "puppy", "hyena", "buffalo",
    // Food & drink oddities
    "cheese", "chocolate", "pizza", "burger", "sandwich", "taco", "burrito", "pasta", "spaghetti",
    "sushi", "ramen", "noodle", "tofu", "cake", "cookie", "biscuit", "donut", "croissant", "bagel",
    "coffee", "tea", "beer", "wine", "vodka", "whiskey", "cocktail", "smoothie", "milkshake",
    "ice cream", "dessert", "snack", "ketchup", "mustard", "mayonnaise", "pickle", "hot sauce",
    "cereal", "breakfast", "buffet", "banquet",
    // Records & competitions
    "guinness", "world record", "record-breaking", "championship", "contest", "tournament",
    "lottery", "jackpot", "prize", "winner", "champion", "medal", "trophy", "award", "competition",
    "challenge", "stunt", "dare", "marathon", "speedrun", "feat", "largest", "smallest", "longest",
    "shortest", "fastest", "slowest",
    // Strange events / places / paranormal
    "alien", "ufo", "extraterrestrial", "spaceship", "flying saucer", "meteor", "asteroid",
    "planet", "moon", "martian", "space", "haunted", "ghost", "cryptid", "bigfoot", "yeti",
    "loch ness", "nessie", "sighting", "apparition", "poltergeist", "vampire", "werewolf", "witch",
    "wizard", "fairy", "gnome", "troll", "mythical", "legend", "folklore", "superstition", "omen",
    "curse", "ritual", "ceremony", "festival", "parade", "eerie", "spooky", "ouija", "seance",
    "haunting", "possession", "enchanted", "supernatural",
    // Quirky human stories / internet culture
    "prank", "hoax", "meme", "viral", "trend", "streaker", "flashmob", "cosplay", "impersonator",
    "lookalike", "superfan", "obsession", "eccentricity", "collection", "collector", "hobbyist",
    "invention", "gadget", "contraption", "device", "innovation", "prototype", "robot", "android",
    "drone", "3d-printed", "hack", "lifehack", "challenge accepted", "stuntman", "influencer",
    "streamer", "tiktoker", "youtuber", "livestream", "emote", "emoji", "shitpost", "shitposting",
    "copypasta", "fanfic",
    // Odd crimes & legal quirks (non-grim)
    "heist", "bandit", "thief", "robber", "burglary", "smuggling", "contraband", "counterfeit",
    "fraud", "scam", "swindle", "arrested", "busted", "police chase", "mugshot", "lawsuit",
    "verdict", "trial", "weird law", "ban", "prohibition", "loophole", "citation", "fine",
    "ordinance", "bylaw", "permit", "confiscated", "seized", "sting operation", "undercover",
    // Tech/objects behaving oddly
    "glitch", "bug", "easter egg", "exploit", "softlock", "physics", "ragdoll", "ai-generated",
    "deepfake", "prompt", "chatbot", "neural", "quantum", "laser", "hologram", "magnet",
    "electromagnet", "tesla coil", "arduino", "raspberry pi", "drone swarm", "robot dog",
    "boston dynamics",
    // Miscellaneous everyday oddity
    "toilet", "bathroom", "restroom", "plumbing", "sewer", "underground", "subway", "tunnel",
    "bridge", "monument", "statue", "sculpture", "artwork", "graffiti", "museum", "exhibit",
    "installation", "performance", "street art", "installation art", "fountain", "roundabout",
    "parking", "traffic cone", "dumpster", "elevator", "escalator", "vending machine", "arcade",
    "claw machine", "jukebox", "karaoke",
    // Geography & "Florida man"-style (neutral)
    "florida", "bavaria", "berlin", "texas", "alaska", "siberia", "iceland", "antarctica", "sahara",
    "amazon", "outback", "transylvania", "village", "hamlet", "remote", "island", "desert",
    "jungle", "tundra", "glacier",
    // Sports but strange
    "mascot", "pitch invasion", "streak", "zamboni", "curling", "sumo", "cheerleader", "air guitar",
    "chess boxing", "bog snorkelling", "wife-carrying", "pumpkin regatta", "cheese rolling",
    "toe wrestling",
    // Money / collectibles / auctions
    "auction", "auctioned", "antique", "relic", "artifact", "collectible", "trading card",
    "pokemon card", "mint condition", "rare", "one-of-a-kind", "limited edition", "garage sale",
    "yard sale",
    // Language & signage oddities
    "typo", "engrish", "misspelled", "mistranslation", "sign", "billboard", "warning sign",
    "road sign", "menu fail", "label fail", "packaging fail", "instructions fail",
];

static SENSITIVE_TOPICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(murder|war|assault|shooting|tragedy|suicide|terror|rape|genocide|massacre)\b")
        .unwrap()
});

fn scan_text(title: &str, body: &str) -> String {
    let head: String = body.chars().take(BODY_SCAN_CHARS).collect();
    format!("{} {}", title, head).to_lowercase()
}

fn hits_in(text: &str) -> Vec<&'static str> {
    LEXICON
        .iter()
        .copied()
        .filter(|keyword| text.contains(keyword))
        .collect()
}

/// Lexicon entries present in the scanned text, in lexicon order.
pub fn keyword_hits(title: &str, body: &str) -> Vec<&'static str> {
    hits_in(&scan_text(title, body))
}

pub fn is_sensitive(title: &str, body: &str) -> bool {
    SENSITIVE_TOPICS.is_match(&scan_text(title, body))
}

/// Score `(title, body)`. Pure and deterministic; may be negative.
pub fn score_weirdness(title: &str, body: &str) -> i32 {
    let text = scan_text(title, body);
    let mut score = hits_in(&text).len() as i32;

    if body.chars().count() > SUBSTANCE_CHARS {
        score += 1;
    }

    if SENSITIVE_TOPICS.is_match(&text) {
        score -= SENSITIVE_PENALTY;
    }

    score
}

pub fn is_admissible(score: i32) -> bool {
    score >= MIN_SCORE
}
