//! Tideswap - Binary Entry Point
//!
//! Settles one NFT sale end to end against in-memory ledgers, as a quick
//! verification that the crate builds and the pipeline runs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use alloy_primitives::{Address, Bytes, U256};
use tideswap::types::order::NO_DATA;
use tideswap::types::{Asset, AssetType};
use tideswap::{
    AssetClass, Eip712Domain, Exchange, ExchangeError, NativeLedger, Order, SignatureValidator,
    TransferProxy, TxContext,
};

type Balances = Rc<RefCell<HashMap<Address, U256>>>;

struct MemoryLedger(Balances);

impl NativeLedger for MemoryLedger {
    fn push(&mut self, recipient: Address, amount: U256) -> Result<(), ExchangeError> {
        *self.0.borrow_mut().entry(recipient).or_default() += amount;
        Ok(())
    }
}

struct MemoryNfts(Rc<RefCell<HashMap<U256, Address>>>);

impl TransferProxy for MemoryNfts {
    fn pull_from(
        &mut self,
        owner: Address,
        recipient: Address,
        asset: &Asset,
    ) -> Result<(), ExchangeError> {
        let nft = asset.asset_type.decode_nft()?;
        let mut owners = self.0.borrow_mut();
        match owners.get(&nft.token_id) {
            Some(current) if *current == owner => {
                owners.insert(nft.token_id, recipient);
                Ok(())
            }
            _ => Err(ExchangeError::ExternalCall("not token owner".into())),
        }
    }
}

/// Stand-in for a contract wallet that pre-approved the listing digest.
struct ApprovedListing(alloy_primitives::B256);

impl SignatureValidator for ApprovedListing {
    fn is_valid_signature(
        &self,
        digest: alloy_primitives::B256,
        _signature: &[u8],
    ) -> Result<bool, ExchangeError> {
        Ok(digest == self.0)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("===========================================");
    println!("  Tideswap - Exchange Engine");
    println!("===========================================");
    println!();

    let owner = Address::from_slice(&[0xAD; 20]);
    let seller = Address::from_slice(&[0x01; 20]);
    let buyer = Address::from_slice(&[0x02; 20]);
    let fee_receiver = Address::from_slice(&[0xFE; 20]);
    let collection = Address::from_slice(&[0x72; 20]);

    let native: Balances = Rc::default();
    let nfts: Rc<RefCell<HashMap<U256, Address>>> = Rc::default();
    nfts.borrow_mut().insert(U256::from(7u64), seller);

    let mut exchange = Exchange::new(
        owner,
        Eip712Domain::new("Tideswap", "1", 1, Address::ZERO),
        250,
        fee_receiver,
        Box::new(MemoryLedger(native.clone())),
    );
    exchange
        .set_transfer_proxy(owner, AssetClass::Erc721, Box::new(MemoryNfts(nfts.clone())))
        .expect("owner wires proxies");

    // Seller lists token #7 for 1 native unit of 10^18; buyer bids it.
    let price = U256::from(1_000_000_000_000_000_000u128);
    let nft = Asset::new(AssetType::erc721(collection, U256::from(7u64)), U256::ONE);
    let money = Asset::new(AssetType::native(), price);

    let sell = Order::new(
        seller,
        nft.clone(),
        Address::ZERO,
        money.clone(),
        U256::from(1u64),
        0,
        0,
        NO_DATA,
        Bytes::new(),
    );
    let buy = Order::new(
        buyer,
        money,
        Address::ZERO,
        nft,
        U256::ZERO,
        0,
        0,
        NO_DATA,
        Bytes::new(),
    );

    // The seller is a contract wallet that pre-approved this exact listing.
    let listing_digest = exchange.domain().signing_hash(sell.hash());
    exchange
        .register_signature_validator(owner, seller, Box::new(ApprovedListing(listing_digest)))
        .expect("owner registers validators");

    println!("Matching sale of token #7 at {price} wei...");
    let ctx = TxContext::new(buyer, 1_700_000_000).with_value(price);
    match exchange.match_orders(&ctx, &sell, &[], &buy, &[]) {
        Ok(receipt) => {
            println!("Settled:");
            println!("  left fill:  {}", receipt.left_fill);
            println!("  right fill: {}", receipt.right_fill);
            for event in &receipt.events {
                println!(
                    "  {:?} {:>26} -> {} ({:?})",
                    event.purpose, event.amount, event.recipient, event.direction
                );
            }
            println!();
            println!("  token #7 owner: {:?}", nfts.borrow().get(&U256::from(7u64)));
            println!("  seller native:  {:?}", native.borrow().get(&seller));
            println!("  fees collected: {:?}", native.borrow().get(&fee_receiver));
        }
        Err(err) => println!("ERROR: match failed: {err}"),
    }
}
