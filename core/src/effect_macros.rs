//! Declarative macros for ergonomic effect construction.

/// Create an `Effect::Future` from an async block body
///
/// # Example
///
/// ```
/// use casaroja_core::{async_effect, effect::Effect};
///
/// let effect: Effect<u32> = async_effect! {
///     Some(42)
/// };
/// assert!(matches!(effect, Effect::Future(_)));
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use crate::effect::Effect;

    #[derive(Clone, Debug, PartialEq)]
    enum PageAction {
        Loaded { items: usize },
    }

    #[tokio::test]
    async fn async_effect_yields_its_action() {
        let effect = async_effect! {
            Some(PageAction::Loaded { items: 3 })
        };

        let Effect::Future(fut) = effect else {
            panic!("expected a future effect");
        };
        assert_eq!(fut.await, Some(PageAction::Loaded { items: 3 }));
    }
}
