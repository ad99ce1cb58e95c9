//! Integration tests for the full generator protocol.
//!
//! Each fixture is a hand-flattened generator body: the comment above it
//! shows the source it stands in for, the closure is the label-dispatching
//! step function a compiler would emit, and the exception table carries the
//! try/catch/finally layout.

use std::{cell::RefCell, rc::Rc};

use genrun::{prelude::*, Error};

/// ```text
/// function* range(limit, step) {
///     let n = 0, count = 0;
///     while (n < limit) { yield n; n += step; count += 1; }
///     return count;
/// }
/// ```
fn range(limit: i32, step: i32) -> CompiledBody<i32> {
    let mut n = 0;
    let mut count = 0;
    CompiledBody::new(0, ExceptionTable::empty(), move |_ctx| {
        if n < limit {
            let value = n;
            n += step;
            count += 1;
            Flow::Yield(value)
        } else {
            Flow::Return(Some(count))
        }
    })
}

/// ```text
/// function* guarded() {
///     try { yield 1; yield 2; }
///     catch (e) { yield e + 100; }
///     yield 3;
///     return 4;
/// }
/// ```
///
/// Labels 0..=2 are the try body, 5 the catch handler, 20 the code after.
fn guarded() -> CompiledBody<i32> {
    let table = ExceptionTable::new(vec![TryEntry::with_catch(0, 3, 5)]);
    CompiledBody::new(0, table, |ctx| match ctx.position() {
        0 => {
            ctx.set_position(1);
            Flow::Yield(1)
        }
        1 => {
            ctx.set_position(2);
            Flow::Yield(2)
        }
        2 => Flow::Leave(20),
        5 => {
            let caught = ctx.take_sent().unwrap_or(0);
            ctx.set_position(6);
            Flow::Yield(caught + 100)
        }
        6 => Flow::Leave(20),
        20 => {
            ctx.set_position(21);
            Flow::Yield(3)
        }
        _ => Flow::Return(Some(4)),
    })
}

/// ```text
/// function* cleanup(log) {
///     try { yield 1; yield 2; }
///     finally { log.push("finally"); yield -1; }
///     yield 3;
/// }
/// ```
///
/// Labels 0..=2 are the try body, 10..=11 the finally body, 20 the code
/// after.
fn cleanup(log: Rc<RefCell<Vec<&'static str>>>) -> CompiledBody<i32> {
    let table = ExceptionTable::new(vec![TryEntry::with_finally(0, 3, 10, 11)]);
    CompiledBody::new(0, table, move |ctx| match ctx.position() {
        0 => {
            ctx.set_position(1);
            Flow::Yield(1)
        }
        1 => {
            ctx.set_position(2);
            Flow::Yield(2)
        }
        2 => Flow::Leave(20),
        10 => {
            log.borrow_mut().push("finally");
            ctx.set_position(11);
            Flow::Yield(-1)
        }
        11 => Flow::EndFinally,
        20 => {
            ctx.set_position(21);
            Flow::Yield(3)
        }
        _ => Flow::Return(None),
    })
}

fn collect(generator: Generator<i32>) -> Vec<i32> {
    generator
        .into_iter()
        .collect::<Result<Vec<i32>, i32>>()
        .unwrap()
}

#[test]
fn test_plain_iteration_to_completion() -> Result<(), i32> {
    let mut generator = wrap(range(20, 3))?;

    let mut yields = Vec::new();
    let last = loop {
        let result = generator.next(None)?;
        if result.done {
            break result;
        }
        yields.push(result.value.unwrap());
    };

    assert_eq!(yields, vec![0, 3, 6, 9, 12, 15, 18]);
    assert_eq!(last.value, Some(7));
    assert!(generator.is_done());
    Ok(())
}

#[test]
fn test_next_after_done_is_inert() -> Result<(), i32> {
    let mut generator = wrap(range(2, 1))?;
    while !generator.next(None)?.done {}

    assert_eq!(generator.next(None)?, IterResult::finished(None));
    assert_eq!(generator.next(Some(5))?, IterResult::finished(None));
    Ok(())
}

#[test]
fn test_throw_after_done_is_rejected() -> Result<(), i32> {
    let mut generator = wrap(range(2, 1))?;
    while !generator.next(None)?.done {}

    assert!(matches!(generator.throw(9), Err(Error::AlreadyDone)));
    Ok(())
}

#[test]
fn test_finish_after_done_reflects_value() -> Result<(), i32> {
    let mut generator = wrap(range(2, 1))?;
    while !generator.next(None)?.done {}

    assert_eq!(generator.finish(Some(8))?, IterResult::finished(Some(8)));
    Ok(())
}

#[test]
fn test_throw_on_fresh_instance_is_uncaught() -> Result<(), i32> {
    let mut generator = wrap(range(2, 1))?;

    assert!(matches!(generator.throw(7), Err(Error::Uncaught(7))));
    assert!(generator.is_done());
    Ok(())
}

#[test]
fn test_sent_values_reach_suspended_yields() -> Result<(), i32> {
    // let a = yield 0; let b = yield a * 2; return a + b;
    let mut a = 0;
    let body = CompiledBody::new(0, ExceptionTable::empty(), move |ctx| {
        match ctx.position() {
            0 => {
                ctx.set_position(1);
                Flow::Yield(0)
            }
            1 => {
                a = ctx.take_sent().unwrap_or(0);
                ctx.set_position(2);
                Flow::Yield(a * 2)
            }
            _ => {
                let b = ctx.take_sent().unwrap_or(0);
                Flow::Return(Some(a + b))
            }
        }
    });
    let mut generator = wrap(body)?;

    assert_eq!(generator.next(None)?, IterResult::yielded(0));
    assert_eq!(generator.next(Some(3))?, IterResult::yielded(6));
    assert_eq!(generator.next(Some(4))?, IterResult::finished(Some(7)));
    Ok(())
}

#[test]
fn test_injected_throw_takes_catch_path() -> Result<(), i32> {
    let mut generator = wrap(guarded())?;

    assert_eq!(generator.next(None)?, IterResult::yielded(1));
    // The catch handler receives the injected error as its bound value.
    assert_eq!(generator.throw(8)?, IterResult::yielded(108));
    assert_eq!(generator.next(None)?, IterResult::yielded(3));
    assert_eq!(generator.next(None)?, IterResult::finished(Some(4)));
    Ok(())
}

#[test]
fn test_untouched_catch_path_is_skipped() -> Result<(), i32> {
    let generator = wrap(guarded())?;
    assert_eq!(collect(generator), vec![1, 2, 3]);
    Ok(())
}

#[test]
fn test_throw_outside_protected_range_is_uncaught() -> Result<(), i32> {
    let mut generator = wrap(guarded())?;
    generator.next(None)?;
    generator.next(None)?;
    generator.next(None)?; // now suspended at "yield 3", past the try

    assert!(matches!(generator.throw(5), Err(Error::Uncaught(5))));
    Ok(())
}

#[test]
fn test_finally_runs_once_on_normal_exit() -> Result<(), i32> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let generator = wrap(cleanup(log.clone()))?;

    assert_eq!(collect(generator), vec![1, 2, -1, 3]);
    assert_eq!(*log.borrow(), vec!["finally"]);
    Ok(())
}

#[test]
fn test_finish_detours_through_finally() -> Result<(), i32> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut generator = wrap(cleanup(log.clone()))?;

    assert_eq!(generator.next(None)?, IterResult::yielded(1));
    // The return completion is parked while the finally body yields.
    assert_eq!(generator.finish(Some(9))?, IterResult::yielded(-1));
    assert!(!generator.is_done());
    // End of the finally re-delivers the suspended return.
    assert_eq!(generator.next(None)?, IterResult::finished(Some(9)));
    assert_eq!(*log.borrow(), vec!["finally"]);
    Ok(())
}

#[test]
fn test_uncaught_throw_still_runs_finally() -> Result<(), i32> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut generator = wrap(cleanup(log.clone()))?;

    generator.next(None)?;
    assert_eq!(generator.throw(5)?, IterResult::yielded(-1));
    assert!(matches!(generator.next(None), Err(Error::Uncaught(5))));
    assert_eq!(*log.borrow(), vec!["finally"]);
    assert!(generator.is_done());
    Ok(())
}

#[test]
fn test_nested_finallys_run_inner_first() -> Result<(), i32> {
    // try { try { yield 1; return 1; } finally { log inner } }
    // finally { log outer }
    let log = Rc::new(RefCell::new(Vec::new()));
    let table = ExceptionTable::new(vec![
        TryEntry::with_finally(0, 15, 20, 21),
        TryEntry::with_finally(1, 3, 10, 11),
    ]);
    let recorder = log.clone();
    let body = CompiledBody::new(1, table, move |ctx| match ctx.position() {
        1 => {
            ctx.set_position(2);
            Flow::Yield(1)
        }
        2 => Flow::Return(Some(1)),
        10 => {
            recorder.borrow_mut().push("inner");
            ctx.set_position(11);
            Flow::EndFinally
        }
        20 => {
            recorder.borrow_mut().push("outer");
            ctx.set_position(21);
            Flow::EndFinally
        }
        other => Flow::Raise(other as i32),
    });
    let mut generator = wrap(body)?;

    generator.next(None)?;
    assert_eq!(generator.next(None)?, IterResult::finished(Some(1)));
    assert_eq!(*log.borrow(), vec!["inner", "outer"]);
    Ok(())
}

#[test]
fn test_finish_runs_nested_finallys_inner_first() -> Result<(), i32> {
    // try { try { yield 1; ... } finally { log inner } } finally { log outer }
    // with finish(42) requested while suspended inside the inner try.
    let log = Rc::new(RefCell::new(Vec::new()));
    let table = ExceptionTable::new(vec![
        TryEntry::with_finally(0, 15, 20, 21),
        TryEntry::with_finally(1, 3, 10, 11),
    ]);
    let recorder = log.clone();
    let body = CompiledBody::new(1, table, move |ctx| match ctx.position() {
        1 => {
            ctx.set_position(2);
            Flow::Yield(1)
        }
        10 => {
            recorder.borrow_mut().push("inner");
            ctx.set_position(11);
            Flow::EndFinally
        }
        20 => {
            recorder.borrow_mut().push("outer");
            ctx.set_position(21);
            Flow::EndFinally
        }
        other => Flow::Raise(other as i32),
    });
    let mut generator = wrap(body)?;

    generator.next(None)?;
    assert_eq!(generator.finish(Some(42))?, IterResult::finished(Some(42)));
    assert_eq!(*log.borrow(), vec!["inner", "outer"]);
    Ok(())
}

#[test]
fn test_return_inside_finally_overrides_original() -> Result<(), i32> {
    // try { return 1; } finally { return 2; }
    let table = ExceptionTable::new(vec![TryEntry::with_finally(0, 3, 10, 11)]);
    let body = CompiledBody::new(0, table, |ctx| match ctx.position() {
        0 => Flow::Return(Some(1)),
        10 => Flow::Return(Some(2)),
        _ => Flow::EndFinally,
    });
    let mut generator = wrap(body)?;

    assert_eq!(generator.next(None)?, IterResult::finished(Some(2)));
    Ok(())
}

#[test]
fn test_raise_inside_finally_overrides_original() -> Result<(), i32> {
    // try { return 1; } finally { throw 5; }
    let table = ExceptionTable::new(vec![TryEntry::with_finally(0, 3, 10, 11)]);
    let body = CompiledBody::new(0, table, |ctx| match ctx.position() {
        0 => Flow::Return(Some(1)),
        10 => Flow::Raise(5),
        _ => Flow::EndFinally,
    });
    let mut generator = wrap(body)?;

    assert!(matches!(generator.next(None), Err(Error::Uncaught(5))));
    Ok(())
}

#[test]
fn test_catch_rethrow_reaches_outer_catch() -> Result<(), i32> {
    // try { try { throw 1; } catch (e) { throw e + 1; } }
    // catch (e) { return e; }
    let table = ExceptionTable::new(vec![
        TryEntry::with_catch(0, 15, 20),
        TryEntry::with_catch(1, 3, 10),
    ]);
    let body = CompiledBody::new(1, table, |ctx| match ctx.position() {
        1 => Flow::Raise(1),
        10 => {
            let caught = ctx.take_sent().unwrap_or(0);
            Flow::Raise(caught + 1)
        }
        20 => {
            let caught = ctx.take_sent().unwrap_or(0);
            Flow::Return(Some(caught))
        }
        other => Flow::Raise(other as i32),
    });
    let mut generator = wrap(body)?;

    assert_eq!(generator.next(None)?, IterResult::finished(Some(2)));
    Ok(())
}

#[test]
fn test_delegation_to_plain_iterator() -> Result<(), i32> {
    // yield 100; const got = yield* [7, 8]; yield 200;
    let body = CompiledBody::new(0, ExceptionTable::empty(), |ctx| match ctx.position() {
        0 => {
            ctx.set_position(1);
            Flow::Yield(100)
        }
        1 => {
            ctx.set_position(2);
            Flow::Delegate {
                iter: Box::new(IterDelegate(vec![7, 8].into_iter())),
                resume: 2,
            }
        }
        2 => {
            ctx.set_position(3);
            Flow::Yield(200)
        }
        _ => Flow::Return(None),
    });
    let generator = wrap(body)?;

    assert_eq!(collect(generator), vec![100, 7, 8, 200]);
    Ok(())
}

#[test]
fn test_delegation_to_generator_feeds_final_value_back() -> Result<(), i32> {
    // const count = yield* range(4, 2); return count * 10;
    let body = CompiledBody::new(0, ExceptionTable::empty(), |ctx| match ctx.position() {
        0 => {
            ctx.set_position(1);
            match wrap(range(4, 2)) {
                Ok(inner) => Flow::Delegate {
                    iter: Box::new(inner),
                    resume: 1,
                },
                Err(_) => Flow::Raise(-1),
            }
        }
        _ => {
            let count = ctx.take_sent().unwrap_or(0);
            Flow::Return(Some(count * 10))
        }
    });
    let mut generator = wrap(body)?;

    assert_eq!(generator.next(None)?, IterResult::yielded(0));
    assert!(generator.is_delegating());
    assert_eq!(generator.next(None)?, IterResult::yielded(2));
    assert_eq!(generator.next(None)?, IterResult::finished(Some(20)));
    Ok(())
}

#[test]
fn test_throw_into_delegating_generator_hits_inner_catch() -> Result<(), i32> {
    // Inner generator catches and completes; its return value resumes the
    // outer body through the delegation site.
    let mut generator = wrap(delegating_to_guarded())?;

    assert_eq!(generator.next(None)?, IterResult::yielded(1));
    assert!(generator.is_delegating());
    // guarded() turns the injected 8 into a yield of 108.
    assert_eq!(generator.throw(8)?, IterResult::yielded(108));
    assert_eq!(generator.next(None)?, IterResult::yielded(3));
    // guarded() returns 4; the outer body negates it.
    assert_eq!(generator.next(None)?, IterResult::finished(Some(-4)));
    Ok(())
}

/// const got = yield* guarded(); return -got;
fn delegating_to_guarded() -> CompiledBody<i32> {
    CompiledBody::new(0, ExceptionTable::empty(), |ctx| match ctx.position() {
        0 => {
            ctx.set_position(1);
            match wrap(guarded()) {
                Ok(inner) => Flow::Delegate {
                    iter: Box::new(inner),
                    resume: 1,
                },
                Err(_) => Flow::Raise(-1),
            }
        }
        _ => {
            let got = ctx.take_sent().unwrap_or(0);
            Flow::Return(Some(-got))
        }
    })
}

#[test]
fn test_throw_into_plain_iterator_delegate_cleans_up_and_reraises() -> Result<(), i32> {
    // A plain iterator has no throw handling, so the error surfaces at the
    // unprotected delegation site and escapes.
    let body = CompiledBody::new(0, ExceptionTable::empty(), |ctx| match ctx.position() {
        0 => {
            ctx.set_position(1);
            Flow::Delegate {
                iter: Box::new(IterDelegate(vec![1, 2, 3].into_iter())),
                resume: 1,
            }
        }
        _ => Flow::Return(None),
    });
    let mut generator = wrap(body)?;

    assert_eq!(generator.next(None)?, IterResult::yielded(1));
    assert!(matches!(generator.throw(9), Err(Error::Uncaught(9))));
    assert!(generator.is_done());
    Ok(())
}

#[test]
fn test_generator_fn_instances_are_independent() -> Result<(), i32> {
    let counter = mark(|| range(6, 2));

    let mut first = counter.call()?;
    let mut second = counter.call()?;
    assert_eq!(first.next(None)?, IterResult::yielded(0));
    assert_eq!(first.next(None)?, IterResult::yielded(2));
    // The second instance starts from scratch.
    assert_eq!(second.next(None)?, IterResult::yielded(0));
    Ok(())
}

#[test]
fn test_step_limit_guards_non_suspending_body() -> Result<(), i32> {
    // while (true) {}, never suspends.
    let body = CompiledBody::new(0, ExceptionTable::empty(), |_ctx| Flow::Leave(0));
    let limits = DispatchLimits::new().with_max_steps(1_000);
    let mut generator = wrap_with_limits(body, limits)?;

    assert!(matches!(
        generator.next(None),
        Err(Error::StepLimitExceeded { limit: 1_000, .. })
    ));
    assert!(generator.is_done());
    Ok(())
}

#[test]
fn test_wrap_rejects_overlapping_regions() {
    // Two ranges that partially overlap cannot come from nested source tries.
    let table = ExceptionTable::new(vec![
        TryEntry::with_catch(0, 6, 20),
        TryEntry::with_catch(4, 10, 21),
    ]);
    let body = CompiledBody::new(0, table, |_ctx| Flow::Return(None::<i32>));

    assert!(matches!(wrap(body), Err(Error::Malformed { .. })));
}

#[test]
fn test_failed_instance_stays_done() -> Result<(), i32> {
    let body = CompiledBody::new(0, ExceptionTable::empty(), |_ctx| Flow::Raise(1));
    let mut generator = wrap(body)?;

    assert!(matches!(generator.next(None), Err(Error::Uncaught(1))));
    assert_eq!(generator.next(None)?, IterResult::finished(None));
    assert!(matches!(generator.throw(2), Err(Error::AlreadyDone)));
    Ok(())
}
