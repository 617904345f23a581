//! Win-percentage rankings, always recounted from the vote ledger.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Idea, RankedIdea, Vote, VoteStatistics};
use crate::store::SharedStore;

/// `wins / (wins + losses) * 100` rounded half to even at two decimals, 0.0
/// without votes.
pub fn win_percentage(wins: i64, losses: i64) -> f64 {
    let total = wins + losses;
    if total == 0 {
        return 0.0;
    }
    (wins as f64 / total as f64 * 100.0 * 100.0).round_ties_even() / 100.0
}

/// Ideas ordered by win percentage, descending. Equal percentages keep the
/// ideas' insertion order.
pub fn rank_ideas(ideas: &[Idea], votes: &[Vote]) -> Vec<RankedIdea> {
    let mut wins: HashMap<Uuid, i64> = HashMap::new();
    let mut losses: HashMap<Uuid, i64> = HashMap::new();
    for vote in votes {
        *wins.entry(vote.winner_id).or_default() += 1;
        *losses.entry(vote.loser_id).or_default() += 1;
    }

    let mut ranked: Vec<RankedIdea> = ideas
        .iter()
        .map(|idea| {
            let w = wins.get(&idea.id).copied().unwrap_or(0);
            let l = losses.get(&idea.id).copied().unwrap_or(0);
            RankedIdea {
                idea_id: idea.id,
                text: idea.text.clone(),
                origin: idea.origin,
                sentiment: idea.sentiment,
                win_percentage: win_percentage(w, l),
                wins: w,
                losses: l,
                total_votes: w + l,
            }
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.win_percentage.total_cmp(&a.win_percentage));
    ranked
}

#[derive(Clone)]
pub struct Ranking {
    store: SharedStore,
}

impl Ranking {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    async fn load(&self, question_id: Uuid) -> Result<(Vec<Idea>, Vec<Vote>)> {
        if self.store.get_question(question_id).await?.is_none() {
            return Err(Error::not_found(format!("question {question_id}")));
        }
        let ideas = self.store.list_ideas(question_id).await?;
        let votes = self.store.list_votes(question_id).await?;
        Ok((ideas, votes))
    }

    pub async fn rank(&self, question_id: Uuid) -> Result<Vec<RankedIdea>> {
        let (ideas, votes) = self.load(question_id).await?;
        Ok(rank_ideas(&ideas, &votes))
    }

    /// Vote count, idea count and the best idea (head of the ranking, absent
    /// until the first vote).
    pub async fn statistics(&self, question_id: Uuid) -> Result<VoteStatistics> {
        let (ideas, votes) = self.load(question_id).await?;
        let ranked = rank_ideas(&ideas, &votes);
        Ok(VoteStatistics {
            question_id,
            total_votes: votes.len() as i64,
            idea_count: ranked.len(),
            best_idea: if votes.is_empty() {
                None
            } else {
                ranked.into_iter().next()
            },
        })
    }
}
