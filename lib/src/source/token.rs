use crate::source::Error;

/// Span of rendered text bound to a class, or to a member of a class
///
/// Offsets are byte offsets into the rendered text, `end` being exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub start: usize,
    pub end: usize,

    /// Internal name of the class the token refers to (or owning the member it refers to)
    pub owner: String,

    pub member: Option<MemberRef>,
}

/// Name and descriptor of a field or method
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub name: String,
    pub descriptor: String,
}

impl Token {
    /// Make a token, checking that the span and the bound symbol make sense
    ///
    /// The member name and descriptor must be both present or both absent.
    pub fn new(
        start: usize,
        end: usize,
        owner: impl Into<String>,
        member_name: Option<String>,
        member_descriptor: Option<String>,
    ) -> Result<Token, Error> {
        let owner = owner.into();
        if start > end {
            return Err(Error::InvalidToken(format!("start {} is after end {}", start, end)));
        }
        if owner.is_empty() {
            return Err(Error::InvalidToken(format!("token at {}..{} has no owner", start, end)));
        }
        let member = match (member_name, member_descriptor) {
            (None, None) => None,
            (Some(name), Some(descriptor)) => Some(MemberRef { name, descriptor }),
            (name, descriptor) => {
                return Err(Error::InvalidToken(format!(
                    "member name {:?} and descriptor {:?} must both be present or both absent",
                    name, descriptor
                )))
            }
        };
        Ok(Token {
            start,
            end,
            owner,
            member,
        })
    }

    /// Token referring to a class
    pub fn class(start: usize, end: usize, owner: impl Into<String>) -> Result<Token, Error> {
        Token::new(start, end, owner, None, None)
    }

    /// Token referring to a field or method
    pub fn member(
        start: usize,
        end: usize,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<Token, Error> {
        Token::new(start, end, owner, Some(name.into()), Some(descriptor.into()))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}
