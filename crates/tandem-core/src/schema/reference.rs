/// A foreign-key declaration between two entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Accessor name, e.g. `order` or `items`.
    pub name: String,

    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// This entity holds `foreign_key`, the identifier of one `target`.
    BelongsTo { target: String, foreign_key: String },

    /// Many `target` records hold this entity's identifier in
    /// `foreign_key`. `index` names the target index to query, if known.
    HasMany {
        target: String,
        foreign_key: String,
        index: Option<String>,
    },

    /// One `target` record holds this entity's identifier in `foreign_key`.
    HasOne { target: String, foreign_key: String },

    /// Associated through `junction` records carrying this entity's
    /// identifier in `owner_key` and the target's in `target_key`.
    ManyToMany {
        target: String,
        junction: String,
        owner_key: String,
        target_key: String,
    },
}

impl Reference {
    pub fn belongs_to(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Reference {
        Reference {
            name: name.into(),
            kind: ReferenceKind::BelongsTo {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn has_many(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Reference {
        Reference {
            name: name.into(),
            kind: ReferenceKind::HasMany {
                target: target.into(),
                foreign_key: foreign_key.into(),
                index: None,
            },
        }
    }

    pub fn has_one(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Reference {
        Reference {
            name: name.into(),
            kind: ReferenceKind::HasOne {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn many_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        junction: impl Into<String>,
        owner_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Reference {
        Reference {
            name: name.into(),
            kind: ReferenceKind::ManyToMany {
                target: target.into(),
                junction: junction.into(),
                owner_key: owner_key.into(),
                target_key: target_key.into(),
            },
        }
    }

    /// Names the target index a has-many lookup should use.
    pub fn via_index(mut self, name: impl Into<String>) -> Reference {
        if let ReferenceKind::HasMany { index, .. } = &mut self.kind {
            *index = Some(name.into());
        }
        self
    }

    /// The entity this reference points at.
    pub fn target(&self) -> &str {
        match &self.kind {
            ReferenceKind::BelongsTo { target, .. }
            | ReferenceKind::HasMany { target, .. }
            | ReferenceKind::HasOne { target, .. }
            | ReferenceKind::ManyToMany { target, .. } => target,
        }
    }

    /// Returns `true` if traversing the reference yields at most one record.
    pub fn is_singular(&self) -> bool {
        matches!(
            self.kind,
            ReferenceKind::BelongsTo { .. } | ReferenceKind::HasOne { .. }
        )
    }
}
