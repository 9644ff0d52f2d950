use crate::jvm::{BinaryName, FieldType, MethodDescriptor, ParseDescriptor, UnqualifiedName};
use crate::source::{Error, Token};
use std::fmt;

/// Symbol a token can be bound to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Entry {
    /// Class, by internal name
    Class(String),

    Field {
        owner: String,
        name: String,
        descriptor: String,
    },

    Method {
        owner: String,
        name: String,
        descriptor: String,
    },
}

impl Entry {
    /// Internal name of the class, or of the class owning the member
    pub fn owner(&self) -> &str {
        match self {
            Entry::Class(name) => name,
            Entry::Field { owner, .. } | Entry::Method { owner, .. } => owner,
        }
    }

    /// Entry bound to a token
    ///
    /// Returns `None` for tokens that must stay out of the index (references to constructors).
    /// Member descriptors are checked to be well formed.
    fn of_token(token: &Token) -> Result<Option<Entry>, Error> {
        let member = match &token.member {
            None => return Ok(Some(Entry::Class(token.owner.clone()))),
            Some(member) => member,
        };

        if member.descriptor.starts_with('(') {
            if member.name == UnqualifiedName::INIT.as_ref() {
                return Ok(None);
            }
            MethodDescriptor::<BinaryName>::parse(&member.descriptor)?;
            Ok(Some(Entry::Method {
                owner: token.owner.clone(),
                name: member.name.clone(),
                descriptor: member.descriptor.clone(),
            }))
        } else {
            FieldType::<BinaryName>::parse(&member.descriptor)?;
            Ok(Some(Entry::Field {
                owner: token.owner.clone(),
                name: member.name.clone(),
                descriptor: member.descriptor.clone(),
            }))
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Class(name) => write!(f, "class {}", name),
            Entry::Field {
                owner,
                name,
                descriptor,
            } => write!(f, "field {}.{}:{}", owner, name, descriptor),
            Entry::Method {
                owner,
                name,
                descriptor,
            } => write!(f, "method {}.{}{}", owner, name, descriptor),
        }
    }
}

/// Rendered text of a class along with its tokens, each bound to the entry it denotes
///
/// Tokens are kept in the order they were rendered, which is also increasing offset order.
#[derive(Clone, Debug)]
pub struct SourceIndex {
    text: String,
    tokens: Vec<(Token, Entry)>,
}

impl SourceIndex {
    /// Bind every token to its entry
    ///
    /// Each token must cover a non-empty slice of `text` falling on character boundaries.
    pub fn new(text: String, tokens: Vec<Token>) -> Result<SourceIndex, Error> {
        let mut bound = Vec::with_capacity(tokens.len());
        for token in tokens {
            match text.get(token.start..token.end) {
                Some(slice) if !slice.is_empty() => (),
                _ => {
                    return Err(Error::InvalidToken(format!(
                        "span {}..{} does not cover any text (text is {} bytes long)",
                        token.start,
                        token.end,
                        text.len()
                    )))
                }
            }
            if let Some(entry) = Entry::of_token(&token)? {
                bound.push((token, entry));
            }
        }
        Ok(SourceIndex { text, tokens: bound })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Tokens with their entries, in text order
    pub fn tokens(&self) -> impl Iterator<Item = (&Token, &Entry)> {
        self.tokens.iter().map(|(token, entry)| (token, entry))
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Text covered by a token
    pub fn token_text(&self, token: &Token) -> &str {
        self.text.get(token.start..token.end).unwrap_or("")
    }

    /// Token (and entry) covering a byte offset of the text
    pub fn token_at(&self, offset: usize) -> Option<(&Token, &Entry)> {
        let candidate = self.tokens.partition_point(|(token, _)| token.end <= offset);
        self.tokens
            .get(candidate)
            .filter(|(token, _)| token.contains(offset))
            .map(|(token, entry)| (token, entry))
    }

    /// Entry under a byte offset of the text
    pub fn entry_at(&self, offset: usize) -> Option<&Entry> {
        self.token_at(offset).map(|(_, entry)| entry)
    }

    /// Every token referring to an entry, in text order
    pub fn tokens_for<'a>(&'a self, entry: &'a Entry) -> impl Iterator<Item = &'a Token> + 'a {
        self.tokens
            .iter()
            .filter(move |(_, other)| other == entry)
            .map(|(token, _)| token)
    }
}

impl fmt::Display for SourceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn index() -> SourceIndex {
        let text = String::from("class B {\n\tint x;\n\tB y;\n}\n");
        let tokens = vec![
            Token::class(6, 7, "a/B").unwrap(),
            Token::member(15, 16, "a/B", "x", "I").unwrap(),
            Token::class(19, 20, "a/B").unwrap(),
            Token::member(21, 22, "a/B", "y", "La/B;").unwrap(),
        ];
        SourceIndex::new(text, tokens).unwrap()
    }

    #[test]
    fn lookup_by_offset() {
        let index = index();
        assert_eq!(index.entry_at(6), Some(&Entry::Class(String::from("a/B"))));
        assert_eq!(index.entry_at(5), None);
        assert_eq!(index.entry_at(7), None);
        assert_eq!(
            index.entry_at(15),
            Some(&Entry::Field {
                owner: String::from("a/B"),
                name: String::from("x"),
                descriptor: String::from("I"),
            })
        );
        assert_eq!(index.entry_at(100), None);
    }

    #[test]
    fn owners() {
        let index = index();
        for offset in [6, 15, 19, 21] {
            assert_eq!(index.entry_at(offset).map(Entry::owner), Some("a/B"));
        }

        let method = Entry::Method {
            owner: String::from("java/lang/Object"),
            name: String::from("hashCode"),
            descriptor: String::from("()I"),
        };
        assert_eq!(method.owner(), "java/lang/Object");
    }

    #[test]
    fn lookup_by_entry() {
        let index = index();
        let class = Entry::Class(String::from("a/B"));
        let spans: Vec<_> = index.tokens_for(&class).map(|token| (token.start, token.end)).collect();
        assert_eq!(spans, vec![(6, 7), (19, 20)]);
        for token in index.tokens_for(&class) {
            assert_eq!(index.token_text(token), "B");
        }
    }

    #[test]
    fn constructors_are_not_indexed() {
        let text = String::from("INVOKESPECIAL a/B.<init> ()V");
        let tokens = vec![
            Token::class(14, 17, "a/B").unwrap(),
            Token::member(18, 24, "a/B", "<init>", "()V").unwrap(),
        ];
        let index = SourceIndex::new(text, tokens).unwrap();
        assert_eq!(index.token_count(), 1);
        assert_eq!(index.entry_at(14), Some(&Entry::Class(String::from("a/B"))));
        assert_eq!(index.entry_at(18), None);
    }

    #[test]
    fn bad_tokens() {
        let text = String::from("class B {}");
        assert!(matches!(
            SourceIndex::new(text.clone(), vec![Token::class(6, 6, "a/B").unwrap()]),
            Err(Error::InvalidToken(_))
        ));
        assert!(matches!(
            SourceIndex::new(text.clone(), vec![Token::class(6, 20, "a/B").unwrap()]),
            Err(Error::InvalidToken(_))
        ));
        assert!(matches!(
            SourceIndex::new(text, vec![Token::member(6, 7, "a/B", "m", "(I").unwrap()]),
            Err(Error::Jvm(_))
        ));
    }
}
