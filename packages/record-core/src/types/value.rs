/// A field value paired with its null flag.
///
/// `value` holds the type's zero value whenever `is_null` is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldVal<T> {
    pub is_null: bool,
    pub value: T,
}

impl<T> FieldVal<T> {
    /// Creates a non-null value.
    pub fn new(value: T) -> Self {
        Self {
            is_null: false,
            value,
        }
    }

    /// Creates a value with an explicit null flag.
    pub fn with_null(is_null: bool, value: T) -> Self {
        Self { is_null, value }
    }

    /// Converts into an `Option`, discarding the placeholder of a null.
    pub fn into_option(self) -> Option<T> {
        if self.is_null {
            None
        } else {
            Some(self.value)
        }
    }

    /// Maps the contained value, keeping the null flag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldVal<U> {
        FieldVal {
            is_null: self.is_null,
            value: f(self.value),
        }
    }
}

impl<T: Default> FieldVal<T> {
    /// Creates a null value.
    pub fn null() -> Self {
        Self {
            is_null: true,
            value: T::default(),
        }
    }
}

impl<T: Default> From<Option<T>> for FieldVal<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => FieldVal::new(v),
            None => FieldVal::null(),
        }
    }
}
