use crate::model::Reaction;

/// All reactions on a comment that use the same emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionGroup {
    pub emoji: String,
    /// Display names, with the current user shown as "You" and listed first.
    pub users: Vec<String>,
    pub reacted: bool,
}

impl ReactionGroup {
    pub fn count(&self) -> usize {
        self.users.len()
    }

    /// Tooltip text such as "You, Jane Doe reacted with 👍".
    pub fn summary(&self) -> String {
        format!("{} reacted with {}", self.users.join(", "), self.emoji)
    }
}

/// Groups reactions by emoji, keeping the order in which each emoji was first used.
pub fn group_reactions(reactions: &[Reaction], current_user: &str) -> Vec<ReactionGroup> {
    let mut groups: Vec<ReactionGroup> = Vec::new();
    for reaction in reactions {
        let index = match groups.iter().position(|g| g.emoji == reaction.emoji) {
            Some(index) => index,
            None => {
                groups.push(ReactionGroup {
                    emoji: reaction.emoji.clone(),
                    users: Vec::new(),
                    reacted: false,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[index];
        if reaction.user == current_user {
            group.reacted = true;
            group.users.insert(0, "You".to_string());
        } else {
            group.users.push(reaction.user.clone());
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(emoji: &str, user: &str) -> Reaction {
        Reaction {
            emoji: emoji.into(),
            user: user.into(),
        }
    }

    #[test]
    fn groups_in_first_seen_order_with_current_user_first() {
        let reactions = [
            reaction("🚀", "Jane Doe"),
            reaction("👍", "Ali Rahimi"),
            reaction("🚀", "Farzan"),
            reaction("🚀", "Mina"),
        ];
        let groups = group_reactions(&reactions, "Farzan");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].emoji, "🚀");
        assert_eq!(groups[0].users, vec!["You", "Jane Doe", "Mina"]);
        assert!(groups[0].reacted);
        assert_eq!(groups[0].count(), 3);
        assert_eq!(groups[0].summary(), "You, Jane Doe, Mina reacted with 🚀");

        assert_eq!(groups[1].emoji, "👍");
        assert!(!groups[1].reacted);
    }

    #[test]
    fn no_reactions_no_groups() {
        assert!(group_reactions(&[], "You").is_empty());
    }
}
