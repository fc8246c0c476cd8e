//! Narrative context attached to a match.
//!
//! A small decade-keyed table of quotes and facts about Chicago. The entry
//! closest in time is used, with landmark-specific facts overriding the
//! decade fact. Choices are derived from the entry id so the same match
//! always tells the same story.

use serde::Serialize;
use sha3::{Digest, Sha3_256};
use timelens_core::CatalogEntry;
use utoipa::ToSchema;

const STORY_SOURCE: &str = "Chicago Historical Society";

struct DecadeStories {
    decade: i32,
    quotes: &'static [&'static str],
    facts: &'static [&'static str],
}

const DECADES: &[DecadeStories] = &[
    DecadeStories {
        decade: 1920,
        quotes: &[
            "The roar of the elevated trains mixed with the clip-clop of horse-drawn carriages.",
            "Prohibition couldn't stop Chicago's spirit - it just moved underground.",
            "The city rebuilt itself from the ashes into America's Second City.",
            "Jazz music spilled from speakeasies onto the bustling sidewalks.",
        ],
        facts: &[
            "Chicago's population reached 2.7 million in 1920, making it the second-largest US city.",
            "The elevated train system was already 30 years old and the envy of other cities.",
            "State Street was known as 'That Great Street' with the world's largest department stores.",
            "Al Capone's empire was just beginning to take control of the city's underground.",
        ],
    },
    DecadeStories {
        decade: 1930,
        quotes: &[
            "Even during the Depression, Chicago's spirit couldn't be broken.",
            "Families found joy in simple pleasures - the zoo, the beach, the parks.",
            "Architecture reached new heights with Art Deco masterpieces.",
            "The Century of Progress fair showed Chicago's optimism for the future.",
        ],
        facts: &[
            "The 1933-34 World's Fair brought 48 million visitors to Chicago.",
            "Many of Chicago's most beautiful buildings were constructed during this decade.",
            "The Cubs won the National League pennant in 1932, 1935, and 1938.",
            "Lincoln Park Zoo remained free during the Great Depression, providing entertainment for struggling families.",
        ],
    },
    DecadeStories {
        decade: 1940,
        quotes: &[
            "Chicago became the 'Arsenal of Democracy' during World War II.",
            "Victory gardens sprouted in Grant Park and neighborhood lots.",
            "The Cubs played their last World Series for 71 years.",
            "Soldiers shipped out from Union Station to battlefields across the globe.",
        ],
        facts: &[
            "Chicago manufactured everything from aircraft engines to ammunition during WWII.",
            "The city's population peaked at nearly 3.6 million residents.",
            "O'Hare Airport began as a manufacturing facility for Douglas C-54 aircraft.",
            "The Great Migration brought hundreds of thousands of African Americans north to Chicago.",
        ],
    },
    DecadeStories {
        decade: 1950,
        quotes: &[
            "Post-war optimism filled the air as Chicago modernized at breakneck speed.",
            "The sound of construction mixed with jazz spilling from nightclub doorways.",
            "Families flocked downtown to see the latest movies at grand theaters.",
            "The suburbs began calling, but the city's heart still beat strong.",
        ],
        facts: &[
            "Chicago's population peaked at 3.6 million residents in 1950.",
            "The Chicago Housing Authority built massive public housing projects.",
            "State Street featured some of the world's largest department stores.",
            "The Cubs haven't won a World Series since 1908, and fans still believe.",
        ],
    },
    DecadeStories {
        decade: 1960,
        quotes: &[
            "The winds of change swept through Chicago as civil rights gained momentum.",
            "Modern architecture began transforming the iconic skyline.",
            "Rock and roll music echoed from record shops along Michigan Avenue.",
            "The Democratic Convention of 1968 would forever change the city's image.",
        ],
        facts: &[
            "The second wave of the Great Migration continued bringing families north.",
            "Urban renewal projects dramatically reshaped entire neighborhoods.",
            "Chicago became a major hub for blues and emerging rock music.",
            "The Sears Tower would soon rise to become the world's tallest building.",
        ],
    },
    DecadeStories {
        decade: 1970,
        quotes: &[
            "Chicago's neighborhoods each told their own story of America.",
            "The counterculture movement found a home in Old Town and Lincoln Park.",
            "Disco lights reflected off the Chicago River on weekend nights.",
            "The city began its transformation from industrial powerhouse to service center.",
        ],
        facts: &[
            "The Willis (Sears) Tower was completed in 1973 as the world's tallest building.",
            "Chicago became a major hub for the emerging hip-hop and house music scenes.",
            "The city's manufacturing base began declining as jobs moved overseas.",
            "Neighborhoods like Old Town became centers of artistic and cultural renaissance.",
        ],
    },
    DecadeStories {
        decade: 1980,
        quotes: &[
            "Chicago reinvented itself as a global city of finance and culture.",
            "The lakefront became a playground for the emerging professional class.",
            "House music was born in Chicago's underground club scene.",
            "The city's skyline reached new heights with gleaming towers.",
        ],
        facts: &[
            "Chicago became a major financial center rivaling New York.",
            "The city's population stabilized at around 3 million residents.",
            "Grant Park began its transformation into what would become Millennium Park.",
            "Chicago's restaurant scene exploded with innovative chefs and cuisines.",
        ],
    },
];

/// Story returned with a match.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoricalStory {
    /// Period quote
    #[schema(example = "Post-war optimism filled the air as Chicago modernized at breakneck speed.")]
    pub quote: &'static str,
    /// Fact about the decade, or about a landmark in the photo
    pub fact: String,
    #[schema(example = "Chicago Historical Society")]
    pub source: &'static str,
    /// Decade the story was drawn from
    #[schema(example = 1950)]
    pub decade: i32,
    /// The catalog entry's own narrative hook, when it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Decade table closest to `year`; ties go to the earlier decade.
fn closest_decade(year: i32) -> &'static DecadeStories {
    DECADES
        .iter()
        .min_by_key(|d| (d.decade - year).abs())
        .unwrap_or(&DECADES[0])
}

fn landmark_fact(landmark: &str, year: i32) -> Option<String> {
    let landmark = landmark.to_lowercase();
    let fact = if landmark.contains("state street") {
        "State Street was known as 'That Great Street' and featured the world's largest department stores including Marshall Field's.".to_string()
    } else if landmark.contains("wrigley field") {
        if year < 1950 {
            "Wrigley Field was already known as the 'Friendly Confines,' but the Cubs' championship drought was just beginning.".to_string()
        } else {
            format!("By {year}, the Cubs hadn't won a World Series since 1908 - but hope springs eternal at Wrigley Field.")
        }
    } else if landmark.contains("navy pier") {
        "Navy Pier was originally built as Municipal Pier in 1916 for shipping and recreation."
            .to_string()
    } else if landmark.contains("union station") {
        "Union Station's Great Hall was called the gateway to the American West, processing thousands of travelers daily.".to_string()
    } else {
        return None;
    };
    Some(fact)
}

/// Build the story for a matched catalog entry.
pub fn historical_story(entry: &CatalogEntry) -> HistoricalStory {
    let stories = closest_decade(entry.year);
    let digest = Sha3_256::digest(entry.id.as_bytes());

    let quote = stories.quotes[usize::from(digest[0]) % stories.quotes.len()];
    let fact = entry
        .landmark_names
        .iter()
        .find_map(|name| landmark_fact(name, entry.year))
        .unwrap_or_else(|| {
            stories.facts[usize::from(digest[1]) % stories.facts.len()].to_string()
        });

    HistoricalStory {
        quote,
        fact,
        source: STORY_SOURCE,
        decade: stories.decade,
        context: entry.story_context.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timelens_core::{Coordinate, LocationSource, ViewingArc};

    fn entry(id: &str, year: i32, landmarks: &[&str]) -> CatalogEntry {
        CatalogEntry::new(
            id,
            "Test photo",
            year,
            Coordinate::new(41.88, -87.63, LocationSource::Catalog).unwrap(),
            ViewingArc::new(0, 90).unwrap(),
        )
        .with_landmarks(landmarks.iter().copied())
    }

    #[test]
    fn test_closest_decade() {
        assert_eq!(closest_decade(1948).decade, 1950);
        assert_eq!(closest_decade(1925).decade, 1920); // tie → earlier
        assert_eq!(closest_decade(1890).decade, 1920);
        assert_eq!(closest_decade(2010).decade, 1980);
    }

    #[test]
    fn test_story_is_deterministic() {
        let e = entry("loop_1920", 1920, &[]);
        assert_eq!(historical_story(&e), historical_story(&e));
    }

    #[test]
    fn test_story_draws_from_decade_table() {
        let story = historical_story(&entry("x", 1962, &[]));
        let table = closest_decade(1960);
        assert_eq!(story.decade, 1960);
        assert!(table.quotes.contains(&story.quote));
        assert!(table.facts.contains(&story.fact.as_str()));
        assert_eq!(story.source, STORY_SOURCE);
    }

    #[test]
    fn test_wrigley_fact_depends_on_year() {
        let early = historical_story(&entry("w1", 1945, &["Wrigley Field"]));
        assert!(early.fact.contains("Friendly Confines"));

        let late = historical_story(&entry("w2", 1962, &["Wrigley Field"]));
        assert!(late.fact.starts_with("By 1962"));
    }

    #[test]
    fn test_wrigley_building_is_not_the_ballpark() {
        let story = historical_story(&entry("m", 1960, &["Wrigley Building"]));
        assert!(!story.fact.contains("Cubs"));
    }

    #[test]
    fn test_landmark_fact_overrides_decade_fact() {
        let story = historical_story(&entry("pier", 1920, &["Navy Pier"]));
        assert!(story.fact.contains("Municipal Pier"));
    }

    #[test]
    fn test_story_context_carried() {
        let e = entry("ctx", 1950, &[]).with_story_context("Shoppers crowd the sidewalk.");
        assert_eq!(
            historical_story(&e).context.as_deref(),
            Some("Shoppers crowd the sidewalk.")
        );
    }
}
