//! Job name abbreviations

/// Map a reported job name (e.g. "WhiteMage", "Dark Knight") to its short form
pub fn job_abbreviation(name: &str) -> Option<&'static str> {
    let key: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    let abbr = match key.as_str() {
        "whitemage" => "whm",
        "scholar" => "sch",
        "astrologian" => "ast",
        "sage" => "sge",
        "darkknight" => "drk",
        "paladin" => "pld",
        "gunbreaker" => "gnb",
        "warrior" => "war",
        "redmage" => "rdm",
        "blackmage" => "blm",
        "summoner" => "smn",
        "bard" => "brd",
        "machinist" => "mch",
        "dancer" => "dnc",
        "monk" => "mnk",
        "samurai" => "sam",
        "dragoon" => "drg",
        "reaper" => "rpr",
        "ninja" => "nin",
        _ => return None,
    };
    Some(abbr)
}
