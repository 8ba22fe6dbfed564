use super::coin_price::CoinPriceManager;
use super::scheduler::Scheduler;
use crate::core::{CoinPrice, MarketDataProvider};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Delivery {
    Single,
    Map,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SubscriptionKey {
    tag: String,
    coin_uids: Vec<String>,
    delivery: Delivery,
}

enum Sink {
    Single(UnboundedSender<CoinPrice>),
    Map(UnboundedSender<HashMap<String, CoinPrice>>),
}

struct Subscription {
    id: u64,
    sink: Sink,
}

#[derive(Default)]
struct CurrencyEntry {
    /// Every live handle sharing a key gets its own sink.
    subscriptions: HashMap<SubscriptionKey, Vec<Subscription>>,
    scheduler: Option<Scheduler>,
}

impl CurrencyEntry {
    fn coin_uids(&self) -> BTreeSet<String> {
        self.subscriptions
            .keys()
            .flat_map(|key| key.coin_uids.iter().cloned())
            .collect()
    }
}

struct Inner {
    provider: Arc<dyn MarketDataProvider>,
    price_manager: Arc<CoinPriceManager>,
    interval: Duration,
    currencies: Mutex<HashMap<String, CurrencyEntry>>,
    next_id: AtomicU64,
}

/// Polls spot prices per currency for the coins that live subscriptions
/// ask for and routes each result to the subscriptions that want it.
pub struct CoinPriceSyncManager {
    inner: Arc<Inner>,
}

/// Receiving end of a price subscription. Dropping it unsubscribes.
pub struct PriceSubscription<T> {
    receiver: UnboundedReceiver<T>,
    currency_code: String,
    key: SubscriptionKey,
    id: u64,
    manager: Weak<Inner>,
}

impl<T> PriceSubscription<T> {
    pub fn tag(&self) -> &str {
        &self.key.tag
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }
}

impl<T> Drop for PriceSubscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.manager.upgrade() {
            inner.unsubscribe(&self.currency_code, &self.key, self.id);
        }
    }
}

impl CoinPriceSyncManager {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        price_manager: Arc<CoinPriceManager>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                price_manager,
                interval,
                currencies: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn coin_price_subscription(
        &self,
        tag: &str,
        coin_uid: &str,
        currency_code: &str,
    ) -> PriceSubscription<CoinPrice> {
        let (tx, receiver) = unbounded_channel();
        let key = SubscriptionKey {
            tag: tag.to_string(),
            coin_uids: vec![coin_uid.to_string()],
            delivery: Delivery::Single,
        };
        let id = self
            .inner
            .subscribe(currency_code, key.clone(), Sink::Single(tx));

        PriceSubscription {
            receiver,
            currency_code: currency_code.to_string(),
            key,
            id,
            manager: Arc::downgrade(&self.inner),
        }
    }

    pub fn coin_price_map_subscription(
        &self,
        tag: &str,
        coin_uids: &[String],
        currency_code: &str,
    ) -> PriceSubscription<HashMap<String, CoinPrice>> {
        let (tx, receiver) = unbounded_channel();
        let coin_uids: BTreeSet<String> = coin_uids.iter().cloned().collect();
        let key = SubscriptionKey {
            tag: tag.to_string(),
            coin_uids: coin_uids.into_iter().collect(),
            delivery: Delivery::Map,
        };
        let id = self
            .inner
            .subscribe(currency_code, key.clone(), Sink::Map(tx));

        PriceSubscription {
            receiver,
            currency_code: currency_code.to_string(),
            key,
            id,
            manager: Arc::downgrade(&self.inner),
        }
    }

    /// Fetches prices for `currency_code` now, outside the regular cycle.
    pub fn refresh(&self, currency_code: &str) {
        let currencies = self.inner.lock();
        if let Some(scheduler) = currencies
            .get(currency_code)
            .and_then(|entry| entry.scheduler.as_ref())
        {
            scheduler.refresh();
        }
    }

    /// Coin uids currently polled for `currency_code`, sorted.
    pub fn active_coin_uids(&self, currency_code: &str) -> Vec<String> {
        self.inner
            .lock()
            .get(currency_code)
            .map(|entry| entry.coin_uids().into_iter().collect())
            .unwrap_or_default()
    }

    /// Stops every currency timer and forgets all subscriptions.
    pub fn stop(&self) {
        let stopped: HashMap<_, _> = std::mem::take(&mut *self.inner.lock());
        debug!(currencies = stopped.len(), "Price sync stopped");
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CurrencyEntry>> {
        self.currencies.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscribe(self: &Arc<Self>, currency_code: &str, key: SubscriptionKey, sink: Sink) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut currencies = self.lock();
        let entry = currencies.entry(currency_code.to_string()).or_default();

        let known = entry.coin_uids();
        let adds_coins = key.coin_uids.iter().any(|uid| !known.contains(uid));
        debug!(currency = %currency_code, tag = %key.tag, "Price subscription added");
        entry
            .subscriptions
            .entry(key)
            .or_default()
            .push(Subscription { id, sink });

        if entry.scheduler.is_none() {
            entry.scheduler = Some(self.start_scheduler(currency_code));
        } else if adds_coins {
            if let Some(scheduler) = &entry.scheduler {
                scheduler.refresh();
            }
        }
        id
    }

    fn unsubscribe(&self, currency_code: &str, key: &SubscriptionKey, id: u64) {
        let mut currencies = self.lock();
        let Some(entry) = currencies.get_mut(currency_code) else {
            return;
        };

        if let Some(subscriptions) = entry.subscriptions.get_mut(key) {
            subscriptions.retain(|s| s.id != id);
            if subscriptions.is_empty() {
                entry.subscriptions.remove(key);
            }
            debug!(currency = %currency_code, tag = %key.tag, "Price subscription removed");
        }
        if entry.subscriptions.is_empty() {
            // Dropping the entry stops its scheduler.
            currencies.remove(currency_code);
            debug!(currency = %currency_code, "Price scheduler stopped");
        }
    }

    fn start_scheduler(self: &Arc<Self>, currency_code: &str) -> Scheduler {
        let weak = Arc::downgrade(self);
        let currency = currency_code.to_string();

        Scheduler::start(format!("prices-{currency}"), self.interval, move || {
            let weak = weak.clone();
            let currency = currency.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    inner.sync(&currency).await;
                }
            }
        })
    }

    async fn sync(&self, currency_code: &str) {
        let coin_uids: Vec<String> = match self.lock().get(currency_code) {
            Some(entry) => entry.coin_uids().into_iter().collect(),
            None => return,
        };
        if coin_uids.is_empty() {
            return;
        }

        match self
            .provider
            .fetch_coin_prices(&coin_uids, currency_code)
            .await
        {
            Ok(prices) => {
                debug!(currency = %currency_code, count = prices.len(), "Fetched coin prices");
                self.price_manager.handle_updated(&prices);
                self.publish(currency_code, &prices);
            }
            Err(e) => {
                warn!(currency = %currency_code, error = %e, "Failed to fetch coin prices");
            }
        }
    }

    fn publish(&self, currency_code: &str, prices: &HashMap<String, CoinPrice>) {
        let currencies = self.lock();
        let Some(entry) = currencies.get(currency_code) else {
            return;
        };

        for (key, subscriptions) in &entry.subscriptions {
            let subset: HashMap<String, CoinPrice> = key
                .coin_uids
                .iter()
                .filter_map(|uid| prices.get(uid).map(|p| (uid.clone(), p.clone())))
                .collect();
            if subset.is_empty() {
                continue;
            }

            for subscription in subscriptions {
                match &subscription.sink {
                    Sink::Single(tx) => {
                        if let Some(price) = subset.values().next() {
                            let _ = tx.send(price.clone());
                        }
                    }
                    Sink::Map(tx) => {
                        let _ = tx.send(subset.clone());
                    }
                }
            }
        }
    }
}
