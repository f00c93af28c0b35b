mod common;

use rust_decimal::Decimal;

use common::*;
use tally_ledger::{AccountFilter, ErrorKind, JournalFilter, NewAccount, PageRequest};

#[tokio::test]
async fn tenants_cannot_reach_each_other() {
    let ledger = ledger();
    let a = tenant(&ledger, "Tenant A").await;
    let b = tenant(&ledger, "Tenant B").await;

    // Same account number in both tenants is fine.
    let a_cash = account(&ledger, &a, "1000", "Cash", ASSET).await;
    let a_revenue = account(&ledger, &a, "4000", "Revenue", REVENUE).await;
    let b_cash = account(&ledger, &b, "1000", "Cash", ASSET).await;
    let b_revenue = account(&ledger, &b, "4000", "Revenue", REVENUE).await;

    ledger
        .create_journal_entry(&ctx(), a.id, transfer(&a_cash, &a_revenue, "50", "50"))
        .await
        .unwrap();

    // get by id
    let err = ledger.get_account(&ctx(), b.id, a_cash.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = ledger
        .get_account_balance(&ctx(), b.id, a_cash.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // list
    let page = ledger
        .list_accounts(&ctx(), b.id, AccountFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
    assert!(page.items.iter().all(|acc| acc.tenant_id == b.id));

    let entries = ledger
        .list_journal_entries(&ctx(), b.id, JournalFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(entries.total_count, 0);

    // post against a foreign account
    let err = ledger
        .create_journal_entry(&ctx(), b.id, transfer(&a_cash, &b_revenue, "10", "10"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // foreign parent
    let err = ledger
        .create_account(
            &ctx(),
            b.id,
            NewAccount::new("1100", "Sub", ASSET, "USD").with_parent(a_cash.id),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    // B's balances untouched, A's reflect only A's entry
    for id in [b_cash.id, b_revenue.id] {
        let bal = ledger.get_account_balance(&ctx(), b.id, id).await.unwrap();
        assert_eq!(bal.debit_balance, Decimal::ZERO);
        assert_eq!(bal.credit_balance, Decimal::ZERO);
    }
    let a_bal = ledger.get_account_balance(&ctx(), a.id, a_cash.id).await.unwrap();
    assert_eq!(a_bal.debit_balance, Decimal::from(50));
}

#[tokio::test]
async fn journal_entries_are_invisible_across_tenants() {
    let ledger = ledger();
    let a = tenant(&ledger, "Tenant A").await;
    let b = tenant(&ledger, "Tenant B").await;
    let cash = account(&ledger, &a, "1000", "Cash", ASSET).await;
    let revenue = account(&ledger, &a, "4000", "Revenue", REVENUE).await;

    let entry = ledger
        .create_journal_entry(&ctx(), a.id, transfer(&cash, &revenue, "1", "1"))
        .await
        .unwrap();

    let err = ledger.get_journal_entry(&ctx(), b.id, entry.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let filtered = ledger
        .list_journal_entries(
            &ctx(),
            b.id,
            JournalFilter {
                account_id: Some(cash.id),
                ..JournalFilter::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert!(filtered.items.is_empty());
}
